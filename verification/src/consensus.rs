//! The aggregation rule: unanimous AND over all registered verifiers.
//!
//! With two verifiers this is a 2-of-2 trust split. One corrupt verifier can
//! block a true fact (false negative) but can never approve a false one.

use crate::state::VerifierSet;

/// The derived state of a verifier set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsensusOutcome {
    /// Not every registered verifier has attested yet.
    Unresolved { have: usize, need: usize },
    /// Every attestation is true.
    Approved,
    /// Every verifier attested and at least one said false.
    Rejected,
}

/// Compute the outcome of a verifier set. Pure; caches nothing.
pub fn tally(set: &VerifierSet) -> ConsensusOutcome {
    let need = set.len();
    let have = set.attested_count();
    if need == 0 || have < need {
        return ConsensusOutcome::Unresolved { have, need };
    }
    let all_true = set
        .verifiers()
        .iter()
        .all(|v| v.attestation.is_some_and(|a| a.result));
    if all_true {
        ConsensusOutcome::Approved
    } else {
        ConsensusOutcome::Rejected
    }
}
