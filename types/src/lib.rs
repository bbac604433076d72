//! Fundamental types for the FIXInsured flight-delay policy.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! addresses, amounts, digests, timestamps and the immutable policy creation parameters.

pub mod address;
pub mod amount;
pub mod error;
pub mod hash;
pub mod params;
pub mod time;

pub use address::Address;
pub use amount::Amount;
pub use error::TypesError;
pub use hash::{ClaimDigest, PolicyId};
pub use params::{NoClaimPremium, PolicyParams, PolicyTimeouts};
pub use time::Timestamp;
