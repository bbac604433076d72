use fixinsured_vrf::VrfError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LotteryError {
    #[error("insurer pool is full ({0} candidates)")]
    PoolFull(u32),

    #[error("{0} has already entered the pool")]
    AlreadyEntered(String),

    #[error("wrong deposit: expected {expected}, got {got}")]
    WrongDeposit { expected: u128, got: u128 },

    #[error("insurer weight must be at least 1")]
    ZeroWeight,

    #[error("pool not full: {have} of {need} candidates")]
    PoolNotFull { have: usize, need: usize },

    #[error("lottery already resolved")]
    AlreadyResolved,

    #[error("selector {selector} returned an invalid draw: {reason}")]
    InvalidSelection { selector: String, reason: String },

    #[error("randomness unavailable: {0}")]
    Randomness(#[from] VrfError),

    #[error("no escrowed funds for {0}")]
    NothingHeld(String),

    #[error("premium already deposited")]
    PremiumHeld,

    #[error("arithmetic overflow in escrow accounting")]
    Overflow,

    #[error("escrow invariant violated: {0}")]
    Invariant(String),
}
