//! Verifier registration, attestation and consensus for both roles.

use crate::context::CallContext;
use crate::error::PolicyError;
use crate::event::PolicyEvent;
use crate::policy::Policy;
use crate::state::PolicyState;
use fixinsured_types::Address;
use fixinsured_verification::{tally, ConsensusOutcome, VerifierRole, VerifierSet};
use tracing::info;

impl Policy {
    fn verifier_set(&self, role: VerifierRole) -> &VerifierSet {
        match role {
            VerifierRole::Eligibility => &self.eligibility,
            VerifierRole::Accident => &self.accident,
        }
    }

    fn verifier_set_mut(&mut self, role: VerifierRole) -> &mut VerifierSet {
        match role {
            VerifierRole::Eligibility => &mut self.eligibility,
            VerifierRole::Accident => &mut self.accident,
        }
    }

    pub(crate) fn is_verifier(&self, address: &Address) -> bool {
        self.eligibility.contains(address) || self.accident.contains(address)
    }

    /// Register an eligibility verifier. Owner-only, OPEN_UNVERIFIED, before
    /// the first eligibility attestation.
    pub fn add_eligibility_verifier(
        &mut self,
        ctx: &CallContext,
        verifier: Address,
    ) -> Result<(), PolicyError> {
        self.register_verifier(ctx, VerifierRole::Eligibility, verifier)
    }

    /// Register an accident verifier. Owner-only, OPEN_UNVERIFIED.
    pub fn add_accident_verifier(
        &mut self,
        ctx: &CallContext,
        verifier: Address,
    ) -> Result<(), PolicyError> {
        self.register_verifier(ctx, VerifierRole::Accident, verifier)
    }

    fn register_verifier(
        &mut self,
        ctx: &CallContext,
        role: VerifierRole,
        verifier: Address,
    ) -> Result<(), PolicyError> {
        let op = match role {
            VerifierRole::Eligibility => "add_eligibility_verifier",
            VerifierRole::Accident => "add_accident_verifier",
        };
        self.transact(op, |p| {
            p.require_owner(ctx, op)?;
            p.require_state(PolicyState::OpenUnverified, op)?;
            ctx.require_no_value()?;
            if verifier == p.owner {
                return Err(PolicyError::InvalidArgument(
                    "the insured cannot verify its own claim".into(),
                ));
            }
            p.verifier_set_mut(role).register(verifier.clone())?;
            p.pending_events
                .push(PolicyEvent::VerifierRegistered { role, verifier });
            Ok(())
        })
    }

    /// Record the caller's eligibility attestation.
    ///
    /// The last attestation finalises consensus: `true` moves the policy to
    /// OPEN_VERIFIED, `false` closes it.
    pub fn verify_eligibility(&mut self, ctx: &CallContext, result: bool) -> Result<(), PolicyError> {
        self.transact("verify_eligibility", |p| {
            require_registered(&p.eligibility, &ctx.caller)?;
            p.require_state(PolicyState::OpenUnverified, "verify_eligibility")?;
            ctx.require_no_value()?;
            if p.premium_range.is_none() {
                return Err(PolicyError::State(
                    "premium range must be set before eligibility attestations".into(),
                ));
            }
            if p.accident.is_empty() {
                return Err(PolicyError::State(
                    "accident verifiers must be registered before eligibility attestations".into(),
                ));
            }
            p.record_attestation(ctx, VerifierRole::Eligibility, result)?;

            if let Some(approved) = p.try_finalize(VerifierRole::Eligibility)? {
                let to = if approved {
                    PolicyState::OpenVerified
                } else {
                    PolicyState::Closed
                };
                p.transition(to, ctx.now)?;
            }
            Ok(())
        })
    }

    /// Record the caller's accident attestation. The last attestation moves
    /// the policy to ACCIDENT_VERIFIED whichever way consensus went.
    pub fn verify_accident(&mut self, ctx: &CallContext, result: bool) -> Result<(), PolicyError> {
        self.transact("verify_accident", |p| {
            require_registered(&p.accident, &ctx.caller)?;
            p.require_state(PolicyState::ActivePolicy, "verify_accident")?;
            ctx.require_no_value()?;
            p.record_attestation(ctx, VerifierRole::Accident, result)?;

            if p.try_finalize(VerifierRole::Accident)?.is_some() {
                p.transition(PolicyState::AccidentVerified, ctx.now)?;
            }
            Ok(())
        })
    }

    fn record_attestation(
        &mut self,
        ctx: &CallContext,
        role: VerifierRole,
        result: bool,
    ) -> Result<(), PolicyError> {
        self.verifier_set_mut(role)
            .attest(&ctx.caller, result, ctx.now)?;
        self.pending_events.push(PolicyEvent::Attested {
            role,
            verifier: ctx.caller.clone(),
            result,
        });
        Ok(())
    }

    /// Finalise the role's consensus if every verifier has attested.
    fn try_finalize(&mut self, role: VerifierRole) -> Result<Option<bool>, PolicyError> {
        if !self.verifier_set(role).is_complete() {
            return Ok(None);
        }
        let result = self.verifier_set_mut(role).finalize()?;
        info!(policy = %self.id, %role, result, "verifier consensus reached");
        self.pending_events
            .push(PolicyEvent::ConsensusReached { role, result });
        Ok(Some(result))
    }

    /// The unanimous eligibility result. Fails with `NotReady` until every
    /// registered eligibility verifier has attested.
    pub fn eligibility_final_result(&self) -> Result<bool, PolicyError> {
        self.final_result(VerifierRole::Eligibility)
    }

    /// The unanimous accident result. Fails with `NotReady` until every
    /// registered accident verifier has attested.
    pub fn accident_final_result(&self) -> Result<bool, PolicyError> {
        self.final_result(VerifierRole::Accident)
    }

    fn final_result(&self, role: VerifierRole) -> Result<bool, PolicyError> {
        let set = self.verifier_set(role);
        if let Some(result) = set.final_result() {
            return Ok(result);
        }
        match tally(set) {
            ConsensusOutcome::Approved => Ok(true),
            ConsensusOutcome::Rejected => Ok(false),
            ConsensusOutcome::Unresolved { have, need } => Err(PolicyError::NotReady(format!(
                "{role} consensus has {have} of {need} attestations"
            ))),
        }
    }
}

/// Authorization half of the attestation guard; runs before the state check.
fn require_registered(set: &VerifierSet, caller: &Address) -> Result<(), PolicyError> {
    if !set.contains(caller) {
        return Err(PolicyError::Authorization(format!(
            "{caller} is not a registered {} verifier",
            set.role()
        )));
    }
    Ok(())
}
