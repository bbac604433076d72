use fixinsured_lottery::LotteryError;
use fixinsured_store::StoreError;
use fixinsured_types::TypesError;
use fixinsured_verification::ConsensusError;
use fixinsured_vrf::VrfError;
use thiserror::Error;

/// Every rejected policy operation surfaces exactly one of these. A failed
/// call leaves the policy untouched.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("unauthorized: {0}")]
    Authorization(String),

    #[error("invalid in current state: {0}")]
    State(String),

    #[error("capacity exceeded: {0}")]
    Capacity(String),

    #[error("payment rejected: {0}")]
    Payment(String),

    #[error("{0} has already attested")]
    DuplicateAttestation(String),

    #[error("not ready: {0}")]
    NotReady(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("randomness unavailable: {0}")]
    Randomness(String),

    #[error("escrow error: {0}")]
    Escrow(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl PolicyError {
    /// Whether resubmitting the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PolicyError::NotReady(_) | PolicyError::State(_) | PolicyError::Randomness(_)
        )
    }
}

impl From<ConsensusError> for PolicyError {
    fn from(e: ConsensusError) -> Self {
        match e {
            ConsensusError::NotRegistered(..) => PolicyError::Authorization(e.to_string()),
            ConsensusError::AlreadyAttested(who) => PolicyError::DuplicateAttestation(who),
            ConsensusError::RegistrationClosed(..) => PolicyError::State(e.to_string()),
            ConsensusError::NotReady { .. } | ConsensusError::NoVerifiers(_) => {
                PolicyError::NotReady(e.to_string())
            }
            ConsensusError::AlreadyRegistered(..) | ConsensusError::Dataset(_) => {
                PolicyError::InvalidArgument(e.to_string())
            }
        }
    }
}

impl From<LotteryError> for PolicyError {
    fn from(e: LotteryError) -> Self {
        match e {
            LotteryError::PoolFull(_) => PolicyError::Capacity(e.to_string()),
            LotteryError::WrongDeposit { .. } => PolicyError::Payment(e.to_string()),
            LotteryError::AlreadyEntered(_)
            | LotteryError::ZeroWeight
            | LotteryError::InvalidSelection { .. } => PolicyError::InvalidArgument(e.to_string()),
            LotteryError::PoolNotFull { .. } => PolicyError::NotReady(e.to_string()),
            LotteryError::AlreadyResolved => PolicyError::State(e.to_string()),
            LotteryError::Randomness(inner) => PolicyError::Randomness(inner.to_string()),
            LotteryError::NothingHeld(_)
            | LotteryError::PremiumHeld
            | LotteryError::Overflow
            | LotteryError::Invariant(_) => PolicyError::Escrow(e.to_string()),
        }
    }
}

impl From<VrfError> for PolicyError {
    fn from(e: VrfError) -> Self {
        PolicyError::Randomness(e.to_string())
    }
}

impl From<TypesError> for PolicyError {
    fn from(e: TypesError) -> Self {
        PolicyError::InvalidArgument(e.to_string())
    }
}
