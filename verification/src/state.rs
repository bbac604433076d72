//! Verifier set state tracking.

use crate::consensus::{tally, ConsensusOutcome};
use crate::error::ConsensusError;
use fixinsured_types::{Address, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Which fact a verifier attests to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerifierRole {
    /// The claim matches a valid, correctly priced booking.
    Eligibility,
    /// The insured event occurred.
    Accident,
}

impl fmt::Display for VerifierRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifierRole::Eligibility => write!(f, "eligibility"),
            VerifierRole::Accident => write!(f, "accident"),
        }
    }
}

/// A recorded attestation. Immutable once stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub result: bool,
    pub timestamp: Timestamp,
}

/// A registered verifier and its attestation, if any.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verifier {
    pub address: Address,
    pub attestation: Option<Attestation>,
}

/// The verifiers for one role, in registration order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifierSet {
    role: VerifierRole,
    verifiers: Vec<Verifier>,
    registration_closed: bool,
    /// Cached once computed; never changes afterwards.
    final_result: Option<bool>,
}

impl VerifierSet {
    pub fn new(role: VerifierRole) -> Self {
        Self {
            role,
            verifiers: Vec::new(),
            registration_closed: false,
            final_result: None,
        }
    }

    pub fn role(&self) -> VerifierRole {
        self.role
    }

    pub fn verifiers(&self) -> &[Verifier] {
        &self.verifiers
    }

    pub fn len(&self) -> usize {
        self.verifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verifiers.is_empty()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.verifiers.iter().any(|v| v.address == *address)
    }

    /// The attestation recorded by `address`, if it is registered and has attested.
    pub fn attestation_of(&self, address: &Address) -> Option<bool> {
        self.verifiers
            .iter()
            .find(|v| v.address == *address)
            .and_then(|v| v.attestation.map(|a| a.result))
    }

    pub fn attested_count(&self) -> usize {
        self.verifiers
            .iter()
            .filter(|v| v.attestation.is_some())
            .count()
    }

    /// True when at least one verifier is registered and all have attested.
    pub fn is_complete(&self) -> bool {
        !self.verifiers.is_empty() && self.attested_count() == self.verifiers.len()
    }

    pub fn is_registration_closed(&self) -> bool {
        self.registration_closed
    }

    /// The cached final result, once [`VerifierSet::finalize`] has succeeded.
    pub fn final_result(&self) -> Option<bool> {
        self.final_result
    }

    /// Check that `address` could be registered, without registering it.
    pub fn check_register(&self, address: &Address) -> Result<(), ConsensusError> {
        if self.registration_closed {
            return Err(ConsensusError::RegistrationClosed(
                address.to_string(),
                self.role,
            ));
        }
        if self.contains(address) {
            return Err(ConsensusError::AlreadyRegistered(
                address.to_string(),
                self.role,
            ));
        }
        Ok(())
    }

    /// Register a verifier. Rejected once registration has closed or on duplicates.
    pub fn register(&mut self, address: Address) -> Result<(), ConsensusError> {
        self.check_register(&address)?;
        debug!(role = %self.role, verifier = %address, "verifier registered");
        self.verifiers.push(Verifier {
            address,
            attestation: None,
        });
        Ok(())
    }

    /// Close registration. Happens implicitly with the first attestation.
    pub fn close_registration(&mut self) {
        self.registration_closed = true;
    }

    /// Check that `address` could attest, without recording anything.
    pub fn check_attest(&self, address: &Address) -> Result<(), ConsensusError> {
        let verifier = self
            .verifiers
            .iter()
            .find(|v| v.address == *address)
            .ok_or_else(|| ConsensusError::NotRegistered(address.to_string(), self.role))?;
        if verifier.attestation.is_some() {
            return Err(ConsensusError::AlreadyAttested(address.to_string()));
        }
        Ok(())
    }

    /// Record an attestation from a registered verifier that has not yet attested.
    pub fn attest(
        &mut self,
        address: &Address,
        result: bool,
        now: Timestamp,
    ) -> Result<(), ConsensusError> {
        self.check_attest(address)?;
        self.registration_closed = true;
        if let Some(verifier) = self.verifiers.iter_mut().find(|v| v.address == *address) {
            verifier.attestation = Some(Attestation {
                result,
                timestamp: now,
            });
        }
        debug!(role = %self.role, verifier = %address, result, "attestation recorded");
        Ok(())
    }

    /// Derive and cache the final result.
    ///
    /// Fails with `NotReady` until every registered verifier has attested.
    /// Once computed, the result is returned unchanged on every later call.
    pub fn finalize(&mut self) -> Result<bool, ConsensusError> {
        if let Some(result) = self.final_result {
            return Ok(result);
        }
        let result = match tally(self) {
            ConsensusOutcome::Unresolved { have, need } => {
                if need == 0 {
                    return Err(ConsensusError::NoVerifiers(self.role));
                }
                return Err(ConsensusError::NotReady {
                    role: self.role,
                    have,
                    need,
                });
            }
            ConsensusOutcome::Approved => true,
            ConsensusOutcome::Rejected => false,
        };
        self.final_result = Some(result);
        Ok(result)
    }
}
