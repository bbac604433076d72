//! Account address type with `0x` prefix.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An account address on the hosting ledger: `0x` followed by 40 hex digits.
///
/// Addresses are stored lower-cased so that the same account always compares
/// equal regardless of the checksum casing it was submitted with.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// The standard prefix for all addresses.
    pub const PREFIX: &'static str = "0x";

    /// Number of hex digits after the prefix.
    pub const HEX_LEN: usize = 40;

    /// Create an address from a raw string without validating it.
    ///
    /// Use [`Address::parse`] for untrusted input.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().to_ascii_lowercase())
    }

    /// Parse and validate an address.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let addr = Self::new(raw.trim());
        if addr.is_valid() {
            Ok(addr)
        } else {
            Err(TypesError::InvalidAddress(raw.to_string()))
        }
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this address is well-formed.
    pub fn is_valid(&self) -> bool {
        match self.0.strip_prefix(Self::PREFIX) {
            Some(digits) => {
                digits.len() == Self::HEX_LEN && digits.chars().all(|c| c.is_ascii_hexdigit())
            }
            None => false,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
