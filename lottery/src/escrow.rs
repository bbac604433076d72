//! Escrowed funds held by a policy and the transfers that release them.
//!
//! Every release produces a [`Transfer`] for the host to execute. The escrow
//! keeps running totals so conservation can be checked after every operation:
//! `balance == held stakes + held premium` and
//! `total_deposited == total_released + balance`.

use crate::error::LotteryError;
use fixinsured_types::{Address, Amount};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Why funds leave escrow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferKind {
    /// A losing or expired candidate gets its deposit back.
    StakeRefund,
    /// A selected insurer gets its stake back after a no-claim outcome.
    StakeReturn,
    /// The fixed loss paid to the insured.
    Payout,
    /// A selected insurer's share of the premium.
    PremiumShare,
    /// The premium returned to the insured.
    PremiumRefund,
}

/// An outbound payment owed by the policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub to: Address,
    pub amount: Amount,
    pub kind: TransferKind,
}

/// Split `total` into `parts` equal shares; the remainder goes one unit at a
/// time to the earliest shares. `None` for zero parts.
pub fn split_equally(total: Amount, parts: usize) -> Option<Vec<Amount>> {
    let n = u128::try_from(parts).ok()?;
    let base = total.checked_div(n)?;
    let remainder = total.checked_rem(n)?.raw();
    Some(
        (0..n)
            .map(|i| {
                if i < remainder {
                    Amount::new(base.raw() + 1)
                } else {
                    base
                }
            })
            .collect(),
    )
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Escrow {
    /// Insurer deposits still held, in deposit order.
    stakes: Vec<(Address, Amount)>,
    premium: Option<(Address, Amount)>,
    balance: Amount,
    total_deposited: Amount,
    total_released: Amount,
}

impl Escrow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn total_deposited(&self) -> Amount {
        self.total_deposited
    }

    pub fn total_released(&self) -> Amount {
        self.total_released
    }

    pub fn held_stakes(&self) -> &[(Address, Amount)] {
        &self.stakes
    }

    pub fn stake_of(&self, address: &Address) -> Option<Amount> {
        self.stakes
            .iter()
            .find(|(a, _)| a == address)
            .map(|(_, amount)| *amount)
    }

    pub fn premium(&self) -> Option<&(Address, Amount)> {
        self.premium.as_ref()
    }

    fn credit(&mut self, amount: Amount) -> Result<(), LotteryError> {
        self.balance = self.balance.checked_add(amount).ok_or(LotteryError::Overflow)?;
        self.total_deposited = self
            .total_deposited
            .checked_add(amount)
            .ok_or(LotteryError::Overflow)?;
        Ok(())
    }

    fn debit(&mut self, amount: Amount) -> Result<(), LotteryError> {
        self.balance = self.balance.checked_sub(amount).ok_or(LotteryError::Overflow)?;
        self.total_released = self
            .total_released
            .checked_add(amount)
            .ok_or(LotteryError::Overflow)?;
        Ok(())
    }

    /// Take custody of an insurer's deposit.
    pub fn hold_stake(&mut self, from: Address, amount: Amount) -> Result<(), LotteryError> {
        if self.stake_of(&from).is_some() {
            return Err(LotteryError::AlreadyEntered(from.to_string()));
        }
        self.credit(amount)?;
        debug!(insurer = %from, %amount, "stake held");
        self.stakes.push((from, amount));
        Ok(())
    }

    /// Take custody of the insured's premium.
    pub fn hold_premium(&mut self, from: Address, amount: Amount) -> Result<(), LotteryError> {
        if self.premium.is_some() {
            return Err(LotteryError::PremiumHeld);
        }
        self.credit(amount)?;
        debug!(insured = %from, %amount, "premium held");
        self.premium = Some((from, amount));
        Ok(())
    }

    /// Release one insurer's deposit back to it.
    pub fn release_stake(
        &mut self,
        address: &Address,
        kind: TransferKind,
    ) -> Result<Transfer, LotteryError> {
        let pos = self
            .stakes
            .iter()
            .position(|(a, _)| a == address)
            .ok_or_else(|| LotteryError::NothingHeld(address.to_string()))?;
        let amount = self.stakes[pos].1;
        self.debit(amount)?;
        let (to, amount) = self.stakes.remove(pos);
        Ok(Transfer { to, amount, kind })
    }

    /// Pay every held stake to `insured` as one payout.
    pub fn pay_out(&mut self, insured: &Address) -> Result<Transfer, LotteryError> {
        let total = Amount::checked_sum(self.stakes.iter().map(|(_, a)| *a))
            .ok_or(LotteryError::Overflow)?;
        self.debit(total)?;
        self.stakes.clear();
        Ok(Transfer {
            to: insured.clone(),
            amount: total,
            kind: TransferKind::Payout,
        })
    }

    /// Return the premium to whoever paid it.
    pub fn refund_premium(&mut self) -> Result<Option<Transfer>, LotteryError> {
        let Some((to, amount)) = self.premium.take() else {
            return Ok(None);
        };
        self.debit(amount)?;
        Ok(Some(Transfer {
            to,
            amount,
            kind: TransferKind::PremiumRefund,
        }))
    }

    /// Split the premium equally among `recipients`, earliest first for the remainder.
    /// Zero shares produce no transfer.
    pub fn split_premium(&mut self, recipients: &[Address]) -> Result<Vec<Transfer>, LotteryError> {
        let Some((_, premium)) = self.premium.as_ref() else {
            return Ok(Vec::new());
        };
        let shares = split_equally(*premium, recipients.len())
            .ok_or_else(|| LotteryError::Invariant("no premium recipients".into()))?;
        self.debit(*premium)?;
        self.premium = None;
        Ok(recipients
            .iter()
            .zip(shares)
            .filter(|(_, share)| !share.is_zero())
            .map(|(to, amount)| Transfer {
                to: to.clone(),
                amount,
                kind: TransferKind::PremiumShare,
            })
            .collect())
    }

    /// Release everything back to its depositors.
    pub fn refund_all(&mut self) -> Result<Vec<Transfer>, LotteryError> {
        let holders: Vec<Address> = self.stakes.iter().map(|(a, _)| a.clone()).collect();
        let mut transfers = Vec::with_capacity(holders.len() + 1);
        for holder in &holders {
            transfers.push(self.release_stake(holder, TransferKind::StakeRefund)?);
        }
        transfers.extend(self.refund_premium()?);
        Ok(transfers)
    }

    /// Verify the conservation invariants.
    pub fn check_invariant(&self) -> Result<(), LotteryError> {
        let held = Amount::checked_sum(
            self.stakes
                .iter()
                .map(|(_, a)| *a)
                .chain(self.premium.iter().map(|(_, a)| *a)),
        )
        .ok_or(LotteryError::Overflow)?;
        if held != self.balance {
            return Err(LotteryError::Invariant(format!(
                "balance {} but {} held",
                self.balance, held
            )));
        }
        let accounted = self
            .total_released
            .checked_add(self.balance)
            .ok_or(LotteryError::Overflow)?;
        if accounted != self.total_deposited {
            return Err(LotteryError::Invariant(format!(
                "deposited {} but released + held is {}",
                self.total_deposited, accounted
            )));
        }
        Ok(())
    }
}
