//! Nullable infrastructure for deterministic testing.
//!
//! The policy engine's external collaborators (clock, randomness, storage)
//! sit behind traits or plain values. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network

pub mod clock;
pub mod random;
pub mod store;

pub use clock::NullClock;
pub use random::NullRandom;
pub use store::NullPolicyStore;
