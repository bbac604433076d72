//! Winner selection strategies.
//!
//! A selector maps a 32-byte seed and the candidate list to `count` distinct
//! candidate indices, in draw order. The draw is deterministic given the seed,
//! so anyone holding the randomness output can recompute the winners.

use crate::pool::PotentialInsurer;
use fixinsured_crypto::blake2b_256_multi;

/// Chooses lottery winners from a full candidate pool.
pub trait LotterySelector: Send + Sync {
    /// Return `count` distinct indices into `candidates`, earliest winner first.
    fn select(&self, seed: &[u8; 32], candidates: &[PotentialInsurer], count: usize)
        -> Vec<usize>;

    fn name(&self) -> &str;
}

/// Weighted random selection without replacement.
///
/// Round `r` draws `x = Blake2b(seed || r) mod remaining_weight` and walks the
/// cumulative weights of the candidates still in the pool. A candidate with
/// weight `w` is picked in a round with probability `w / remaining_weight`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WeightedLottery;

impl LotterySelector for WeightedLottery {
    fn select(
        &self,
        seed: &[u8; 32],
        candidates: &[PotentialInsurer],
        count: usize,
    ) -> Vec<usize> {
        let mut remaining: Vec<usize> = (0..candidates.len()).collect();
        let mut winners = Vec::with_capacity(count.min(candidates.len()));

        for round in 0..count as u64 {
            if remaining.is_empty() {
                break;
            }
            let total: u128 = remaining
                .iter()
                .map(|&i| u128::from(candidates[i].weight))
                .sum();
            if total == 0 {
                break;
            }
            let x = draw(seed, round) % total;

            let mut cumulative = 0u128;
            let mut picked = remaining.len() - 1;
            for (pos, &i) in remaining.iter().enumerate() {
                cumulative += u128::from(candidates[i].weight);
                if x < cumulative {
                    picked = pos;
                    break;
                }
            }
            winners.push(remaining.remove(picked));
        }
        winners
    }

    fn name(&self) -> &str {
        "weighted"
    }
}

fn draw(seed: &[u8; 32], round: u64) -> u128 {
    let hash = blake2b_256_multi(&[seed, &round.to_le_bytes()]);
    let mut head = [0u8; 16];
    head.copy_from_slice(&hash[..16]);
    u128::from_le_bytes(head)
}

/// Unweighted selection: each candidate scores `Blake2b(seed || address)` and
/// the `count` lowest scores win. Ties are impossible in practice.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScoreLottery;

impl LotterySelector for ScoreLottery {
    fn select(
        &self,
        seed: &[u8; 32],
        candidates: &[PotentialInsurer],
        count: usize,
    ) -> Vec<usize> {
        let mut scored: Vec<(usize, [u8; 32])> = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| (i, blake2b_256_multi(&[seed, c.address.as_str().as_bytes()])))
            .collect();
        scored.sort_by_key(|s| s.1);
        scored.truncate(count);
        scored.into_iter().map(|(i, _)| i).collect()
    }

    fn name(&self) -> &str {
        "score"
    }
}
