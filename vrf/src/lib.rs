//! Randomness for insurer lottery selection.
//!
//! The lottery must not be predictable or biasable by any single participant.
//! Two providers are offered:
//! - **Beacon**: domain-separates an externally supplied beacon value (e.g. a
//!   ledger block hash fixed after entries closed)
//! - **Commit-reveal**: several parties commit to secrets, then reveal them;
//!   the combined reveals form the seed

pub mod beacon;
pub mod commit_reveal;
pub mod error;

pub use beacon::BeaconVrf;
pub use commit_reveal::{CommitRevealVrf, Commitment, Reveal};
pub use error::VrfError;

/// Trait for providing verifiable randomness.
pub trait VrfProvider: Send + Sync {
    /// Get randomness for a given context (e.g. the policy id).
    fn get_randomness(&self, context: &[u8]) -> Result<RandomOutput, VrfError>;

    /// Verify that a randomness output was correctly generated.
    fn verify(&self, context: &[u8], output: &RandomOutput) -> Result<bool, VrfError>;

    /// Human-readable name of this provider.
    fn name(&self) -> &str;
}

/// The output of a provider: a random value with its proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RandomOutput {
    /// The random bytes (32 bytes).
    pub value: [u8; 32],
    /// Proof that the value was correctly generated.
    pub proof: Vec<u8>,
    /// Round number or epoch the value belongs to.
    pub round: u64,
}
