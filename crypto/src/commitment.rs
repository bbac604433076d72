//! Claim commitment protocol.
//!
//! The insured publishes `keccak256(canonical(tuple))` where the tuple is
//! (first name, middle name, last name, confirmation number, flight code,
//! flight date). Each field is trimmed and lower-cased, then the fields are
//! joined with [`FIELD_SEPARATOR`]. Verifiers run the same function over their
//! private records and compare digests by equality; raw personal data is never
//! exchanged.

use crate::hash::keccak256;
use fixinsured_types::ClaimDigest;
use serde::{Deserialize, Serialize};

/// Separator placed between normalized fields.
pub const FIELD_SEPARATOR: char = ',';

/// The identity and trip details a claim commits to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimTuple {
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    pub last_name: String,
    pub confirmation_number: String,
    pub flight: String,
    pub flight_date: String,
}

impl ClaimTuple {
    pub fn new(
        first_name: impl Into<String>,
        middle_name: impl Into<String>,
        last_name: impl Into<String>,
        confirmation_number: impl Into<String>,
        flight: impl Into<String>,
        flight_date: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            middle_name: middle_name.into(),
            last_name: last_name.into(),
            confirmation_number: confirmation_number.into(),
            flight: flight.into(),
            flight_date: flight_date.into(),
        }
    }

    /// The fields in commitment order.
    pub fn fields(&self) -> [&str; 6] {
        [
            &self.first_name,
            &self.middle_name,
            &self.last_name,
            &self.confirmation_number,
            &self.flight,
            &self.flight_date,
        ]
    }

    /// The normalized string that gets hashed.
    pub fn canonical(&self) -> String {
        let normalized: Vec<String> = self
            .fields()
            .iter()
            .map(|field| field.trim().to_lowercase())
            .collect();
        normalized.join(&FIELD_SEPARATOR.to_string())
    }

    /// Compute this tuple's commitment.
    pub fn digest(&self) -> ClaimDigest {
        commit(self)
    }

    /// Whether this tuple opens `digest`.
    pub fn matches(&self, digest: &ClaimDigest) -> bool {
        self.digest() == *digest
    }
}

/// Compute the claim commitment for a tuple.
pub fn commit(tuple: &ClaimTuple) -> ClaimDigest {
    ClaimDigest::new(keccak256(tuple.canonical().as_bytes()))
}
