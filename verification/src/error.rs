use crate::state::VerifierRole;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("{0} is already a registered {1} verifier")]
    AlreadyRegistered(String, VerifierRole),

    #[error("{1} verifier registration is closed")]
    RegistrationClosed(String, VerifierRole),

    #[error("{0} is not a registered {1} verifier")]
    NotRegistered(String, VerifierRole),

    #[error("{0} has already attested")]
    AlreadyAttested(String),

    #[error("{role} consensus not ready: {have} of {need} attestations")]
    NotReady {
        role: VerifierRole,
        have: usize,
        need: usize,
    },

    #[error("no {0} verifiers registered")]
    NoVerifiers(VerifierRole),

    #[error("dataset error: {0}")]
    Dataset(String),
}
