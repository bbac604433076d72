//! The claim matching oracle a verifier runs before attesting.
//!
//! Given only the published digest (and, for eligibility, the fixed loss), a
//! verifier recomputes the commitment for every private record it holds and
//! answers by equality. Raw personal data never crosses the boundary.

use crate::state::VerifierRole;
use fixinsured_types::{Address, Amount, ClaimDigest};
use tracing::debug;

/// Default price tolerance for eligibility: ±1% (100 basis points).
pub const DEFAULT_TOLERANCE_BPS: u32 = 100;

/// What a verifier is asked about a committed claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClaimQuery {
    /// Is there a booking matching `digest` whose ticket price is within
    /// tolerance of `fixed_loss`?
    Eligibility {
        digest: ClaimDigest,
        fixed_loss: Amount,
    },
    /// Is there a booking matching `digest` whose flight was delayed?
    Accident { digest: ClaimDigest },
}

impl ClaimQuery {
    pub fn digest(&self) -> &ClaimDigest {
        match self {
            ClaimQuery::Eligibility { digest, .. } | ClaimQuery::Accident { digest } => digest,
        }
    }

    pub fn role(&self) -> VerifierRole {
        match self {
            ClaimQuery::Eligibility { .. } => VerifierRole::Eligibility,
            ClaimQuery::Accident { .. } => VerifierRole::Accident,
        }
    }
}

/// A private data source able to answer claim queries.
///
/// Absence of any matching record must answer `false`.
pub trait ClaimMatcher: Send + Sync {
    /// Human-readable name of this data source.
    fn name(&self) -> &str;

    /// Answer a claim query from private records.
    fn matches(&self, query: &ClaimQuery) -> bool;
}

/// Whether `price` lies within `tolerance_bps` basis points of `target`.
///
/// Integer-only: `|price - target| * 10_000 <= target * tolerance_bps`.
/// Overflow counts as out of band.
pub fn within_tolerance(price: Amount, target: Amount, tolerance_bps: u32) -> bool {
    let diff = if price >= target {
        price.raw() - target.raw()
    } else {
        target.raw() - price.raw()
    };
    match (
        diff.checked_mul(10_000),
        target.raw().checked_mul(u128::from(tolerance_bps)),
    ) {
        (Some(lhs), Some(rhs)) => lhs <= rhs,
        _ => false,
    }
}

/// A verifier's off-chain side: its address, role, and private data source.
pub struct OffChainVerifier<M: ClaimMatcher> {
    pub address: Address,
    pub role: VerifierRole,
    matcher: M,
}

impl<M: ClaimMatcher> OffChainVerifier<M> {
    pub fn new(address: Address, role: VerifierRole, matcher: M) -> Self {
        Self {
            address,
            role,
            matcher,
        }
    }

    /// Decide the attestation for a policy's digest.
    pub fn assess(&self, digest: ClaimDigest, fixed_loss: Amount) -> bool {
        let query = match self.role {
            VerifierRole::Eligibility => ClaimQuery::Eligibility { digest, fixed_loss },
            VerifierRole::Accident => ClaimQuery::Accident { digest },
        };
        let result = self.matcher.matches(&query);
        debug!(
            verifier = %self.address,
            role = %self.role,
            source = self.matcher.name(),
            result,
            "claim assessed"
        );
        result
    }
}
