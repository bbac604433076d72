//! The FIXInsured policy: a single owned aggregate with an explicit state tag.
//!
//! ```text
//! OPEN_UNVERIFIED → OPEN_VERIFIED → LOTTERY → ACTIVE_POLICY → ACCIDENT_VERIFIED → CLOSED
//! ```
//!
//! Every mutating operation takes a [`CallContext`] (caller, attached value,
//! current time), checks authorization, then state, then arguments, and runs
//! against a staged copy that replaces the live policy only on success. Fund
//! movements surface as [`Transfer`]s for the host to execute.

pub mod context;
pub mod error;
pub mod event;
mod insurers;
pub mod persistence;
pub mod policy;
pub mod state;
mod verifiers;

pub use context::CallContext;
pub use error::PolicyError;
pub use event::PolicyEvent;
pub use policy::{Policy, PremiumRange};
pub use state::PolicyState;

pub use fixinsured_lottery::{
    LotterySelector, PotentialInsurer, ScoreLottery, SelectedInsurer, Transfer, TransferKind,
    WeightedLottery,
};
pub use fixinsured_verification::{Verifier, VerifierRole, VerifierSet};
