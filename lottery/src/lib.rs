//! Insurer lottery and escrow.
//!
//! Candidates enter a pool with a declared weight and a deposit of exactly
//! `fixed_loss / insurer_limit`. Once the pool is full the lottery draws
//! `insurer_limit` winners using external randomness; losers are refunded and
//! winners' deposits stay in escrow to collateralise the fixed payout.

pub mod error;
pub mod escrow;
pub mod pool;
pub mod selector;

pub use error::LotteryError;
pub use escrow::{split_equally, Escrow, Transfer, TransferKind};
pub use pool::{InsurerPool, LotteryOutcome, PotentialInsurer, SelectedInsurer};
pub use selector::{LotterySelector, ScoreLottery, WeightedLottery};
