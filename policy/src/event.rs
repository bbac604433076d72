use crate::state::PolicyState;
use fixinsured_types::{Address, Amount, PolicyId};
use fixinsured_verification::VerifierRole;

/// Events queued for the host after each accepted operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PolicyEvent {
    Created {
        id: PolicyId,
        owner: Address,
    },
    PremiumRangeSet {
        lower: Amount,
        upper: Amount,
    },
    VerifierRegistered {
        role: VerifierRole,
        verifier: Address,
    },
    Attested {
        role: VerifierRole,
        verifier: Address,
        result: bool,
    },
    /// Every verifier of a role has attested.
    ConsensusReached {
        role: VerifierRole,
        result: bool,
    },
    InsurerEntered {
        insurer: Address,
        weight: u64,
        deposit: Amount,
    },
    LotteryResolved {
        selected: Vec<Address>,
        refunded: Vec<Address>,
        premium: Amount,
        round: u64,
    },
    Settled {
        accident: bool,
        payout: Amount,
    },
    /// A deadline passed and every held deposit was refunded.
    Expired {
        state: PolicyState,
        refunded: Amount,
    },
    StateChanged {
        from: PolicyState,
        to: PolicyState,
    },
}
