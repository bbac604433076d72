//! Verifier consensus for FIXInsured.
//!
//! Two independent verifier sets exist per policy:
//! 1. **Eligibility**: does the committed claim match a valid, correctly priced booking?
//! 2. **Accident**: did the insured event (the flight delay) actually happen?
//!
//! Each set collects one boolean attestation per registered verifier and derives
//! a single result under the unanimity rule: true iff every attestation is true.
//!
//! Verifiers decide how to attest off-chain, by running a [`ClaimMatcher`] over
//! their private records. The matcher is injected, so the consensus code never
//! depends on how a verifier stores its data.

pub mod consensus;
pub mod dataset;
pub mod error;
pub mod matcher;
pub mod state;

pub use consensus::{tally, ConsensusOutcome};
pub use dataset::{FlightDataset, FlightRecord};
pub use error::ConsensusError;
pub use matcher::{ClaimMatcher, ClaimQuery, OffChainVerifier, DEFAULT_TOLERANCE_BPS};
pub use state::{Attestation, Verifier, VerifierRole, VerifierSet};
