//! The potential insurer pool and lottery resolution.

use crate::error::LotteryError;
use crate::selector::LotterySelector;
use fixinsured_types::{Address, Amount, Timestamp};
use fixinsured_vrf::{RandomOutput, VrfProvider};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// A candidate underwriter waiting for the draw.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotentialInsurer {
    pub address: Address,
    /// Declared ticket weight; higher weight means a larger chance of selection.
    pub weight: u64,
    pub deposit: Amount,
    pub entered_at: Timestamp,
}

/// A lottery winner whose stake collateralises the fixed payout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedInsurer {
    pub address: Address,
    pub weight: u64,
    pub stake: Amount,
}

impl From<&PotentialInsurer> for SelectedInsurer {
    fn from(candidate: &PotentialInsurer) -> Self {
        Self {
            address: candidate.address.clone(),
            weight: candidate.weight,
            stake: candidate.deposit,
        }
    }
}

/// Result of a resolved draw.
#[derive(Clone, Debug)]
pub struct LotteryOutcome {
    /// Winners in draw order.
    pub selected: Vec<SelectedInsurer>,
    /// Candidates that lost and are owed their deposit back.
    pub rejected: Vec<PotentialInsurer>,
    pub randomness: RandomOutput,
}

/// Candidates for one policy, plus the winners once drawn.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InsurerPool {
    capacity: u32,
    selections: u32,
    share: Amount,
    candidates: Vec<PotentialInsurer>,
    selected: Vec<SelectedInsurer>,
    resolved: bool,
}

impl InsurerPool {
    /// `capacity` candidates compete for `selections` slots, each paying `share`.
    pub fn new(capacity: u32, selections: u32, share: Amount) -> Self {
        Self {
            capacity,
            selections,
            share,
            candidates: Vec::new(),
            selected: Vec::new(),
            resolved: false,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn selections(&self) -> u32 {
        self.selections
    }

    /// The exact deposit every candidate must attach.
    pub fn share(&self) -> Amount {
        self.share
    }

    pub fn candidates(&self) -> &[PotentialInsurer] {
        &self.candidates
    }

    pub fn selected(&self) -> &[SelectedInsurer] {
        &self.selected
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.candidates.iter().any(|c| c.address == *address)
    }

    pub fn is_full(&self) -> bool {
        self.candidates.len() >= self.capacity as usize
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Sum of the winners' stakes.
    pub fn selected_stake(&self) -> Option<Amount> {
        Amount::checked_sum(self.selected.iter().map(|s| s.stake))
    }

    /// Validate an entry without recording it.
    pub fn check_enter(
        &self,
        address: &Address,
        weight: u64,
        deposit: Amount,
    ) -> Result<(), LotteryError> {
        if self.resolved {
            return Err(LotteryError::AlreadyResolved);
        }
        if self.is_full() {
            return Err(LotteryError::PoolFull(self.capacity));
        }
        if self.contains(address) {
            return Err(LotteryError::AlreadyEntered(address.to_string()));
        }
        if weight == 0 {
            return Err(LotteryError::ZeroWeight);
        }
        if deposit != self.share {
            return Err(LotteryError::WrongDeposit {
                expected: self.share.raw(),
                got: deposit.raw(),
            });
        }
        Ok(())
    }

    /// Record a candidate. Returns `true` when this entry filled the pool.
    pub fn enter(
        &mut self,
        address: Address,
        weight: u64,
        deposit: Amount,
        now: Timestamp,
    ) -> Result<bool, LotteryError> {
        self.check_enter(&address, weight, deposit)?;
        debug!(insurer = %address, weight, "potential insurer entered");
        self.candidates.push(PotentialInsurer {
            address,
            weight,
            deposit,
            entered_at: now,
        });
        Ok(self.is_full())
    }

    /// Draw the winners from a full pool.
    ///
    /// `context` binds the randomness to this policy. The selector's answer is
    /// checked: exactly `selections` distinct in-range indices.
    pub fn resolve(
        &mut self,
        vrf: &dyn VrfProvider,
        selector: &dyn LotterySelector,
        context: &[u8],
    ) -> Result<LotteryOutcome, LotteryError> {
        if self.resolved {
            return Err(LotteryError::AlreadyResolved);
        }
        if !self.is_full() {
            return Err(LotteryError::PoolNotFull {
                have: self.candidates.len(),
                need: self.capacity as usize,
            });
        }

        let randomness = vrf.get_randomness(context)?;
        let count = self.selections as usize;
        let picks = selector.select(&randomness.value, &self.candidates, count);
        self.check_picks(selector, &picks)?;

        let selected: Vec<SelectedInsurer> = picks
            .iter()
            .map(|&i| SelectedInsurer::from(&self.candidates[i]))
            .collect();
        let winners: HashSet<usize> = picks.into_iter().collect();
        let rejected: Vec<PotentialInsurer> = self
            .candidates
            .iter()
            .enumerate()
            .filter(|(i, _)| !winners.contains(i))
            .map(|(_, c)| c.clone())
            .collect();

        info!(
            provider = vrf.name(),
            selector = selector.name(),
            round = randomness.round,
            winners = selected.len(),
            refunded = rejected.len(),
            "insurer lottery resolved"
        );

        self.selected = selected.clone();
        self.resolved = true;
        Ok(LotteryOutcome {
            selected,
            rejected,
            randomness,
        })
    }

    fn check_picks(
        &self,
        selector: &dyn LotterySelector,
        picks: &[usize],
    ) -> Result<(), LotteryError> {
        let invalid = |reason: String| LotteryError::InvalidSelection {
            selector: selector.name().to_string(),
            reason,
        };
        if picks.len() != self.selections as usize {
            return Err(invalid(format!(
                "{} winners, expected {}",
                picks.len(),
                self.selections
            )));
        }
        if let Some(i) = picks.iter().find(|&&i| i >= self.candidates.len()) {
            return Err(invalid(format!("index {i} out of range")));
        }
        if picks.iter().collect::<HashSet<_>>().len() != picks.len() {
            return Err(invalid("duplicate winner".into()));
        }
        Ok(())
    }
}
