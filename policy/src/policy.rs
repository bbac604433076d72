//! The policy aggregate: creation, guarded transitions, read accessors.

use crate::context::CallContext;
use crate::error::PolicyError;
use crate::event::PolicyEvent;
use crate::state::PolicyState;
use fixinsured_crypto::blake2b_256_multi;
use fixinsured_lottery::{
    Escrow, InsurerPool, PotentialInsurer, SelectedInsurer, Transfer,
};
use fixinsured_types::{Address, Amount, PolicyId, PolicyParams, Timestamp};
use fixinsured_verification::{VerifierRole, VerifierSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// The premium band the insured must pay within, fixed once by the owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumRange {
    pub lower: Amount,
    pub upper: Amount,
}

impl PremiumRange {
    pub fn contains(&self, amount: Amount) -> bool {
        self.lower <= amount && amount <= self.upper
    }
}

/// One parametric flight-delay policy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Policy {
    pub(crate) id: PolicyId,
    pub(crate) owner: Address,
    pub(crate) params: PolicyParams,
    pub(crate) created_at: Timestamp,
    pub(crate) state: PolicyState,
    pub(crate) state_entered_at: Timestamp,
    pub(crate) premium_range: Option<PremiumRange>,
    pub(crate) eligibility: VerifierSet,
    pub(crate) accident: VerifierSet,
    pub(crate) pool: InsurerPool,
    pub(crate) escrow: Escrow,
    /// Outbound payments not yet drained by the host.
    pub(crate) pending_transfers: Vec<Transfer>,
    #[serde(skip)]
    pub(crate) pending_events: Vec<PolicyEvent>,
}

impl Policy {
    /// Create a policy owned by `owner` (the insured).
    ///
    /// Parameters are validated; the id is `Blake2b(owner || digest || created_at)`.
    pub fn create(
        owner: Address,
        params: PolicyParams,
        now: Timestamp,
    ) -> Result<Self, PolicyError> {
        params.validate()?;
        let share = params
            .insurer_share()
            .ok_or_else(|| PolicyError::InvalidArgument("insurer_limit must be positive".into()))?;
        let id = PolicyId::new(blake2b_256_multi(&[
            owner.as_str().as_bytes(),
            params.claim_digest.as_bytes(),
            &now.as_secs().to_le_bytes(),
        ]));
        let pool = InsurerPool::new(params.potential_insurer_limit, params.insurer_limit, share);

        info!(
            policy = %id,
            owner = %owner,
            flight = %params.flight_code,
            date = %params.flight_date,
            fixed_loss = %params.fixed_loss,
            "policy created"
        );

        Ok(Self {
            id,
            owner: owner.clone(),
            params,
            created_at: now,
            state: PolicyState::OpenUnverified,
            state_entered_at: now,
            premium_range: None,
            eligibility: VerifierSet::new(VerifierRole::Eligibility),
            accident: VerifierSet::new(VerifierRole::Accident),
            pool,
            escrow: Escrow::new(),
            pending_transfers: Vec::new(),
            pending_events: vec![PolicyEvent::Created { id, owner }],
        })
    }

    // ── Guarded execution ─────────────────────────────────────────────────

    /// Run `op` against a staged copy and commit it only if the operation and
    /// the escrow conservation check both succeed. A closed policy rejects
    /// every operation with `State` before any other guard runs.
    pub(crate) fn transact<T>(
        &mut self,
        op: &'static str,
        f: impl FnOnce(&mut Policy) -> Result<T, PolicyError>,
    ) -> Result<T, PolicyError> {
        if self.state.is_terminal() {
            debug!(policy = %self.id, op, "operation on closed policy rejected");
            return Err(self.wrong_state(op));
        }
        let mut staged = self.clone();
        let result = f(&mut staged).and_then(|value| {
            staged.escrow.check_invariant()?;
            Ok(value)
        });
        match result {
            Ok(value) => {
                *self = staged;
                Ok(value)
            }
            Err(e) => {
                debug!(policy = %self.id, op, state = %self.state, error = %e, "operation rejected");
                Err(e)
            }
        }
    }

    pub(crate) fn require_owner(&self, ctx: &CallContext, op: &str) -> Result<(), PolicyError> {
        if ctx.caller != self.owner {
            return Err(PolicyError::Authorization(format!(
                "{op} is owner-only, called by {}",
                ctx.caller
            )));
        }
        Ok(())
    }

    pub(crate) fn require_state(&self, expected: PolicyState, op: &str) -> Result<(), PolicyError> {
        if self.state != expected {
            return Err(self.wrong_state(op));
        }
        Ok(())
    }

    pub(crate) fn wrong_state(&self, op: &str) -> PolicyError {
        PolicyError::State(format!("{op} not allowed in {}", self.state))
    }

    pub(crate) fn transition(&mut self, to: PolicyState, now: Timestamp) -> Result<(), PolicyError> {
        let from = self.state;
        if !from.can_transition_to(to) {
            return Err(PolicyError::State(format!("no transition {from} -> {to}")));
        }
        if from == PolicyState::OpenUnverified {
            self.eligibility.close_registration();
            self.accident.close_registration();
        }
        self.state = to;
        self.state_entered_at = now;
        info!(policy = %self.id, %from, %to, "policy state changed");
        self.pending_events.push(PolicyEvent::StateChanged { from, to });
        Ok(())
    }

    pub(crate) fn queue_transfers(&mut self, transfers: impl IntoIterator<Item = Transfer>) {
        for transfer in transfers {
            info!(
                policy = %self.id,
                to = %transfer.to,
                amount = %transfer.amount,
                kind = ?transfer.kind,
                "transfer queued"
            );
            self.pending_transfers.push(transfer);
        }
    }

    // ── Configuration ─────────────────────────────────────────────────────

    /// Fix the premium band. Owner-only, once, in OPEN_UNVERIFIED.
    pub fn set_premium_range(
        &mut self,
        ctx: &CallContext,
        lower: Amount,
        upper: Amount,
    ) -> Result<(), PolicyError> {
        self.transact("set_premium_range", |p| {
            p.require_owner(ctx, "set_premium_range")?;
            p.require_state(PolicyState::OpenUnverified, "set_premium_range")?;
            ctx.require_no_value()?;
            if p.premium_range.is_some() {
                return Err(PolicyError::State("premium range already set".into()));
            }
            if lower > upper {
                return Err(PolicyError::InvalidArgument(format!(
                    "premium lower bound {lower} exceeds upper bound {upper}"
                )));
            }
            p.premium_range = Some(PremiumRange { lower, upper });
            info!(policy = %p.id, %lower, %upper, "premium range set");
            p.pending_events.push(PolicyEvent::PremiumRangeSet { lower, upper });
            Ok(())
        })
    }

    // ── Timeouts ──────────────────────────────────────────────────────────

    fn timeout_for(&self, state: PolicyState) -> Option<u64> {
        let timeouts = &self.params.timeouts;
        match state {
            PolicyState::OpenUnverified => timeouts.eligibility_secs,
            PolicyState::OpenVerified => timeouts.insurer_entry_secs,
            PolicyState::Lottery => timeouts.lottery_secs,
            PolicyState::ActivePolicy => timeouts.accident_secs,
            PolicyState::AccidentVerified | PolicyState::Closed => None,
        }
    }

    /// When the current state stops waiting, if it has a deadline.
    pub fn deadline(&self) -> Option<Timestamp> {
        self.timeout_for(self.state)
            .map(|secs| Timestamp::new(self.state_entered_at.as_secs().saturating_add(secs)))
    }

    /// Close a policy whose current state's deadline has passed, refunding
    /// every held insurer deposit and the premium. Any caller.
    pub fn expire(&mut self, ctx: &CallContext) -> Result<Vec<Transfer>, PolicyError> {
        self.transact("expire", |p| {
            let secs = p
                .timeout_for(p.state)
                .ok_or_else(|| p.wrong_state("expire"))?;
            ctx.require_no_value()?;
            if !p.state_entered_at.has_expired(secs, ctx.now) {
                return Err(PolicyError::NotReady(format!(
                    "{} deadline not reached ({}s left)",
                    p.state,
                    secs.saturating_sub(p.state_entered_at.elapsed_since(ctx.now))
                )));
            }
            let expired_in = p.state;
            let refunds = p.escrow.refund_all()?;
            let refunded = Amount::checked_sum(refunds.iter().map(|t| t.amount))
                .ok_or_else(|| PolicyError::Escrow("refund total overflows".into()))?;
            p.queue_transfers(refunds.clone());
            p.transition(PolicyState::Closed, ctx.now)?;
            info!(policy = %p.id, state = %expired_in, %refunded, "policy expired");
            p.pending_events.push(PolicyEvent::Expired {
                state: expired_in,
                refunded,
            });
            Ok(refunds)
        })
    }

    // ── Host interface ────────────────────────────────────────────────────

    /// Take all queued events.
    pub fn drain_events(&mut self) -> Vec<PolicyEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Take all queued outbound transfers for execution.
    pub fn drain_transfers(&mut self) -> Vec<Transfer> {
        std::mem::take(&mut self.pending_transfers)
    }

    pub fn pending_transfers(&self) -> &[Transfer] {
        &self.pending_transfers
    }

    // ── Read accessors ────────────────────────────────────────────────────

    pub fn id(&self) -> PolicyId {
        self.id
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn params(&self) -> &PolicyParams {
        &self.params
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn state(&self) -> PolicyState {
        self.state
    }

    pub fn state_entered_at(&self) -> Timestamp {
        self.state_entered_at
    }

    pub fn premium_range(&self) -> Option<PremiumRange> {
        self.premium_range
    }

    /// The premium held in escrow, if paid and not yet released.
    pub fn premium(&self) -> Option<Amount> {
        self.escrow.premium().map(|(_, amount)| *amount)
    }

    pub fn eligibility_verifiers(&self) -> &VerifierSet {
        &self.eligibility
    }

    pub fn accident_verifiers(&self) -> &VerifierSet {
        &self.accident
    }

    pub fn potential_insurers(&self) -> &[PotentialInsurer] {
        self.pool.candidates()
    }

    pub fn selected_insurers(&self) -> &[SelectedInsurer] {
        self.pool.selected()
    }

    /// The deposit each potential insurer must attach.
    pub fn insurer_share(&self) -> Amount {
        self.pool.share()
    }

    pub fn eligibility_result(&self) -> Option<bool> {
        self.eligibility.final_result()
    }

    pub fn accident_result(&self) -> Option<bool> {
        self.accident.final_result()
    }

    pub fn escrow(&self) -> &Escrow {
        &self.escrow
    }

    pub fn escrow_balance(&self) -> Amount {
        self.escrow.balance()
    }
}
