//! Policy creation parameters: fixed once at deployment, immutable afterwards.

use crate::amount::Amount;
use crate::error::TypesError;
use crate::hash::ClaimDigest;
use serde::{Deserialize, Serialize};

/// What happens to the insured's premium when the accident verifiers
/// conclude the insured event did not occur.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoClaimPremium {
    /// The premium goes back to the insured.
    #[default]
    RefundInsured,
    /// The premium is shared equally among the selected insurers.
    PayInsurers,
}

/// Optional per-state deadlines, in seconds after the policy entered the state.
///
/// A `None` deadline means the state may be held indefinitely. When a deadline
/// passes, anyone may expire the policy, which refunds every held deposit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyTimeouts {
    /// OPEN_UNVERIFIED: waiting for eligibility attestations.
    pub eligibility_secs: Option<u64>,
    /// OPEN_VERIFIED: waiting for potential insurers to enter.
    pub insurer_entry_secs: Option<u64>,
    /// LOTTERY: waiting for the insured to pay the premium and draw.
    pub lottery_secs: Option<u64>,
    /// ACTIVE_POLICY: waiting for accident attestations.
    pub accident_secs: Option<u64>,
}

/// The structural parameters of a policy.
///
/// Loadable from TOML via [`PolicyParams::from_toml_str`]; always run
/// [`PolicyParams::validate`] before creating a policy from them.
/// Serialized form (bincode) keeps full `u128` precision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyParams {
    /// Kind of eligibility verifier the policy expects.
    pub eligibility_verifier_type: u8,

    /// Kind of accident verifier the policy expects.
    pub accident_verifier_type: u8,

    /// Number of candidate insurers required before the lottery can run.
    pub potential_insurer_limit: u32,

    /// Number of insurers the lottery selects.
    pub insurer_limit: u32,

    /// Payout to the insured if the insured event is confirmed.
    pub fixed_loss: Amount,

    /// Commitment over the insured's identity and trip tuple.
    pub claim_digest: ClaimDigest,

    /// Flight code, e.g. `NB1234`.
    pub flight_code: String,

    /// Flight date as an ISO `YYYY-MM-DD` string.
    pub flight_date: String,

    #[serde(default)]
    pub no_claim_premium: NoClaimPremium,

    #[serde(default)]
    pub timeouts: PolicyTimeouts,
}

/// TOML file layout: amounts as integers, the digest as a hex string.
#[derive(Deserialize)]
struct PolicyParamsFile {
    eligibility_verifier_type: u8,
    accident_verifier_type: u8,
    potential_insurer_limit: u32,
    insurer_limit: u32,
    fixed_loss: u64,
    claim_digest: String,
    flight_code: String,
    flight_date: String,
    #[serde(default)]
    no_claim_premium: NoClaimPremium,
    #[serde(default)]
    timeouts: PolicyTimeouts,
}

impl PolicyParams {
    /// Parse parameters from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, TypesError> {
        let file: PolicyParamsFile =
            toml::from_str(s).map_err(|e| TypesError::Config(e.to_string()))?;
        Ok(Self {
            eligibility_verifier_type: file.eligibility_verifier_type,
            accident_verifier_type: file.accident_verifier_type,
            potential_insurer_limit: file.potential_insurer_limit,
            insurer_limit: file.insurer_limit,
            fixed_loss: Amount::new(u128::from(file.fixed_loss)),
            claim_digest: ClaimDigest::from_hex(&file.claim_digest)?,
            flight_code: file.flight_code,
            flight_date: file.flight_date,
            no_claim_premium: file.no_claim_premium,
            timeouts: file.timeouts,
        })
    }

    /// The deposit every potential insurer must attach: `fixed_loss / insurer_limit`.
    ///
    /// Returns `None` for an `insurer_limit` of zero.
    pub fn insurer_share(&self) -> Option<Amount> {
        self.fixed_loss.checked_div(u128::from(self.insurer_limit))
    }

    /// Check the structural invariants of the parameters.
    pub fn validate(&self) -> Result<(), TypesError> {
        if self.insurer_limit == 0 {
            return Err(TypesError::InvalidParams(
                "insurer_limit must be at least 1".into(),
            ));
        }
        if self.potential_insurer_limit < self.insurer_limit {
            return Err(TypesError::InvalidParams(format!(
                "potential_insurer_limit ({}) must be >= insurer_limit ({})",
                self.potential_insurer_limit, self.insurer_limit
            )));
        }
        if self.fixed_loss.is_zero() {
            return Err(TypesError::InvalidParams("fixed_loss must be positive".into()));
        }
        let limit = u128::from(self.insurer_limit);
        if self.fixed_loss.checked_rem(limit) != Some(Amount::ZERO) {
            return Err(TypesError::InvalidParams(format!(
                "fixed_loss ({}) must split evenly across {} insurers",
                self.fixed_loss.raw(),
                self.insurer_limit
            )));
        }
        if self.claim_digest.is_zero() {
            return Err(TypesError::InvalidParams("claim digest is unset".into()));
        }
        if self.flight_code.trim().is_empty() {
            return Err(TypesError::InvalidParams("flight code is empty".into()));
        }
        validate_iso_date(&self.flight_date)
    }
}

/// Accept `YYYY-MM-DD` with a plausible month and day.
fn validate_iso_date(date: &str) -> Result<(), TypesError> {
    let invalid = || TypesError::InvalidDate(date.to_string());
    let bytes = date.as_bytes();
    if !date.is_ascii() || bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return Err(invalid());
    }
    let field = |range: std::ops::Range<usize>| -> Result<u32, TypesError> {
        let part = &date[range];
        if !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        part.parse().map_err(|_| invalid())
    };
    let _year = field(0..4)?;
    let month = field(5..7)?;
    let day = field(8..10)?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(invalid());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> PolicyParams {
        PolicyParams {
            eligibility_verifier_type: 1,
            accident_verifier_type: 1,
            potential_insurer_limit: 6,
            insurer_limit: 3,
            fixed_loss: Amount::new(567),
            claim_digest: ClaimDigest::new([7u8; 32]),
            flight_code: "NB1234".into(),
            flight_date: "2022-05-20".into(),
            no_claim_premium: NoClaimPremium::default(),
            timeouts: PolicyTimeouts::default(),
        }
    }

    #[test]
    fn valid_params_pass() {
        params().validate().unwrap();
        assert_eq!(params().insurer_share(), Some(Amount::new(189)));
    }

    #[test]
    fn zero_insurer_limit_rejected() {
        let mut p = params();
        p.insurer_limit = 0;
        assert!(matches!(p.validate(), Err(TypesError::InvalidParams(_))));
        assert_eq!(p.insurer_share(), None);
    }

    #[test]
    fn pool_smaller_than_selection_rejected() {
        let mut p = params();
        p.potential_insurer_limit = 2;
        assert!(p.validate().is_err());
    }

    #[test]
    fn uneven_fixed_loss_rejected() {
        let mut p = params();
        p.fixed_loss = Amount::new(568);
        assert!(p.validate().is_err());
    }

    #[test]
    fn zero_fixed_loss_rejected() {
        let mut p = params();
        p.fixed_loss = Amount::ZERO;
        assert!(p.validate().is_err());
    }

    #[test]
    fn malformed_dates_rejected() {
        for date in ["2022/05/20", "20-05-2022", "2022-13-01", "2022-05-32", "2022-5-20"] {
            let mut p = params();
            p.flight_date = date.into();
            assert!(
                matches!(p.validate(), Err(TypesError::InvalidDate(_))),
                "{date} should be rejected"
            );
        }
    }

    #[test]
    fn toml_defaults_optional_sections() {
        let toml = r#"
            eligibility_verifier_type = 1
            accident_verifier_type = 1
            potential_insurer_limit = 6
            insurer_limit = 3
            fixed_loss = 300
            claim_digest = "0x0101010101010101010101010101010101010101010101010101010101010101"
            flight_code = "NB1234"
            flight_date = "2022-05-20"

            [timeouts]
            accident_secs = 86400
        "#;
        let p = PolicyParams::from_toml_str(toml).unwrap();
        assert_eq!(p.fixed_loss, Amount::new(300));
        assert_eq!(p.no_claim_premium, NoClaimPremium::RefundInsured);
        assert_eq!(p.timeouts.accident_secs, Some(86400));
        assert_eq!(p.timeouts.lottery_secs, None);
        assert_eq!(p.claim_digest, ClaimDigest::new([1u8; 32]));
        p.validate().unwrap();
    }

    #[test]
    fn toml_with_bad_digest_is_rejected() {
        let toml = r#"
            eligibility_verifier_type = 1
            accident_verifier_type = 1
            potential_insurer_limit = 6
            insurer_limit = 3
            fixed_loss = 300
            claim_digest = "not-hex"
            flight_code = "NB1234"
            flight_date = "2022-05-20"
        "#;
        assert!(matches!(
            PolicyParams::from_toml_str(toml),
            Err(TypesError::InvalidDigest(_))
        ));
    }
}
