//! Insurer entry, the lottery draw, and settlement.

use crate::context::CallContext;
use crate::error::PolicyError;
use crate::event::PolicyEvent;
use crate::policy::Policy;
use crate::state::PolicyState;
use fixinsured_lottery::{LotterySelector, Transfer, TransferKind};
use fixinsured_types::{Address, Amount, NoClaimPremium};
use fixinsured_vrf::VrfProvider;
use tracing::info;

impl Policy {
    /// Enter the insurer pool with `weight`, attaching exactly the insurer
    /// share as `ctx.value`. The entry that fills the pool moves the policy
    /// to LOTTERY.
    pub fn add_potential_insurer(
        &mut self,
        ctx: &CallContext,
        weight: u64,
    ) -> Result<(), PolicyError> {
        self.transact("add_potential_insurer", |p| {
            if ctx.caller == p.owner {
                return Err(PolicyError::Authorization(
                    "the insured cannot underwrite its own policy".into(),
                ));
            }
            if p.is_verifier(&ctx.caller) {
                return Err(PolicyError::Authorization(format!(
                    "{} is a registered verifier and cannot insure",
                    ctx.caller
                )));
            }
            match p.state {
                PolicyState::OpenVerified => {}
                PolicyState::Lottery => {
                    return Err(PolicyError::Capacity(format!(
                        "insurer pool is full ({} candidates)",
                        p.pool.capacity()
                    )))
                }
                _ => return Err(p.wrong_state("add_potential_insurer")),
            }

            let filled = p
                .pool
                .enter(ctx.caller.clone(), weight, ctx.value, ctx.now)?;
            p.escrow.hold_stake(ctx.caller.clone(), ctx.value)?;
            p.pending_events.push(PolicyEvent::InsurerEntered {
                insurer: ctx.caller.clone(),
                weight,
                deposit: ctx.value,
            });
            if filled {
                p.transition(PolicyState::Lottery, ctx.now)?;
            }
            Ok(())
        })
    }

    /// Draw the selected insurers. Owner-only, in LOTTERY, with the premium
    /// attached as `ctx.value` inside the premium range.
    ///
    /// Losers' deposits are refunded; winners' stay in escrow. Returns the
    /// refund transfers.
    pub fn resolve_lottery(
        &mut self,
        ctx: &CallContext,
        vrf: &dyn VrfProvider,
        selector: &dyn LotterySelector,
    ) -> Result<Vec<Transfer>, PolicyError> {
        self.transact("resolve_lottery", |p| {
            p.require_owner(ctx, "resolve_lottery")?;
            p.require_state(PolicyState::Lottery, "resolve_lottery")?;
            let range = p
                .premium_range
                .ok_or_else(|| PolicyError::State("premium range was never set".into()))?;
            if !range.contains(ctx.value) {
                return Err(PolicyError::Payment(format!(
                    "premium {} outside [{}, {}]",
                    ctx.value, range.lower, range.upper
                )));
            }

            let outcome = p.pool.resolve(vrf, selector, p.id.as_bytes())?;
            p.escrow.hold_premium(ctx.caller.clone(), ctx.value)?;

            let mut refunds = Vec::with_capacity(outcome.rejected.len());
            for loser in &outcome.rejected {
                refunds.push(
                    p.escrow
                        .release_stake(&loser.address, TransferKind::StakeRefund)?,
                );
            }
            p.queue_transfers(refunds.clone());

            let collateral = p.pool.selected_stake();
            if collateral != Some(p.params.fixed_loss) {
                return Err(PolicyError::Escrow(format!(
                    "selected stake {:?} does not cover fixed loss {}",
                    collateral, p.params.fixed_loss
                )));
            }

            p.pending_events.push(PolicyEvent::LotteryResolved {
                selected: outcome.selected.iter().map(|s| s.address.clone()).collect(),
                refunded: outcome.rejected.iter().map(|r| r.address.clone()).collect(),
                premium: ctx.value,
                round: outcome.randomness.round,
            });
            p.transition(PolicyState::ActivePolicy, ctx.now)?;
            Ok(refunds)
        })
    }

    /// Release escrow according to the accident result. Any caller, once,
    /// in ACCIDENT_VERIFIED.
    ///
    /// Accident confirmed: the insured receives the fixed loss and the
    /// premium is split equally among the selected insurers. No accident:
    /// stakes go back to the insurers and the premium follows the policy's
    /// [`NoClaimPremium`] rule.
    pub fn settle(&mut self, ctx: &CallContext) -> Result<Vec<Transfer>, PolicyError> {
        self.transact("settle", |p| {
            p.require_state(PolicyState::AccidentVerified, "settle")?;
            ctx.require_no_value()?;
            let accident = p
                .accident
                .final_result()
                .ok_or_else(|| PolicyError::NotReady("accident result not finalised".into()))?;
            let winners: Vec<Address> = p
                .pool
                .selected()
                .iter()
                .map(|s| s.address.clone())
                .collect();

            let mut transfers = Vec::new();
            let payout = if accident {
                let payout = p.escrow.pay_out(&p.owner)?;
                let amount = payout.amount;
                transfers.push(payout);
                transfers.extend(p.escrow.split_premium(&winners)?);
                amount
            } else {
                for winner in &winners {
                    transfers.push(p.escrow.release_stake(winner, TransferKind::StakeReturn)?);
                }
                match p.params.no_claim_premium {
                    NoClaimPremium::RefundInsured => transfers.extend(p.escrow.refund_premium()?),
                    NoClaimPremium::PayInsurers => {
                        transfers.extend(p.escrow.split_premium(&winners)?)
                    }
                }
                Amount::ZERO
            };
            if !p.escrow.balance().is_zero() {
                return Err(PolicyError::Escrow(format!(
                    "{} left in escrow after settlement",
                    p.escrow.balance()
                )));
            }

            p.queue_transfers(transfers.clone());
            info!(policy = %p.id, accident, %payout, "policy settled");
            p.pending_events.push(PolicyEvent::Settled { accident, payout });
            p.transition(PolicyState::Closed, ctx.now)?;
            Ok(transfers)
        })
    }
}
