use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a policy is in its lifecycle. States only ever move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyState {
    /// Created; verifiers are registered and eligibility is being checked.
    OpenUnverified,
    /// Eligibility confirmed; potential insurers may enter.
    OpenVerified,
    /// The insurer pool is full; waiting for the insured to pay and draw.
    Lottery,
    /// Coverage in force; accident verifiers attest.
    ActivePolicy,
    /// The accident outcome is known; waiting for settlement.
    AccidentVerified,
    /// Terminal.
    Closed,
}

impl PolicyState {
    /// The next state in the forward chain.
    pub fn next(self) -> Option<PolicyState> {
        match self {
            PolicyState::OpenUnverified => Some(PolicyState::OpenVerified),
            PolicyState::OpenVerified => Some(PolicyState::Lottery),
            PolicyState::Lottery => Some(PolicyState::ActivePolicy),
            PolicyState::ActivePolicy => Some(PolicyState::AccidentVerified),
            PolicyState::AccidentVerified => Some(PolicyState::Closed),
            PolicyState::Closed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == PolicyState::Closed
    }

    /// Forward one step, or straight to `Closed` (eligibility rejection, expiry).
    pub fn can_transition_to(self, to: PolicyState) -> bool {
        self.next() == Some(to) || (to == PolicyState::Closed && !self.is_terminal())
    }
}

impl fmt::Display for PolicyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PolicyState::OpenUnverified => "OPEN_UNVERIFIED",
            PolicyState::OpenVerified => "OPEN_VERIFIED",
            PolicyState::Lottery => "LOTTERY",
            PolicyState::ActivePolicy => "ACTIVE_POLICY",
            PolicyState::AccidentVerified => "ACCIDENT_VERIFIED",
            PolicyState::Closed => "CLOSED",
        };
        f.write_str(name)
    }
}
