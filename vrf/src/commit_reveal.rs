//! Commit-reveal randomness.
//!
//! Every participant (e.g. each potential insurer as it enters) commits to
//! `Blake2b(domain || address || secret)`. Once commitments close, each
//! participant reveals its secret. The seed is the hash of all reveals in
//! address order, so it is unpredictable as long as one participant's secret
//! is. A participant that withholds its reveal stalls the draw; it cannot
//! choose a different value.

use crate::{RandomOutput, VrfError, VrfProvider};
use fixinsured_crypto::{blake2b_256, blake2b_256_multi};
use fixinsured_types::Address;
use tracing::debug;

const DOMAIN: &[u8] = b"fixinsured/commit-reveal";

/// A commitment from a participant.
#[derive(Clone, Debug)]
pub struct Commitment {
    pub participant: Address,
    /// Hash of the secret, bound to the participant address.
    pub hash: [u8; 32],
}

impl Commitment {
    /// Build the commitment a participant publishes for `secret`.
    pub fn for_secret(participant: Address, secret: &[u8; 32]) -> Self {
        let hash = commitment_hash(&participant, secret);
        Self { participant, hash }
    }
}

/// A reveal from a participant.
#[derive(Clone, Debug)]
pub struct Reveal {
    pub participant: Address,
    /// The actual secret value.
    pub value: [u8; 32],
}

fn commitment_hash(participant: &Address, secret: &[u8; 32]) -> [u8; 32] {
    blake2b_256_multi(&[DOMAIN, participant.as_str().as_bytes(), secret])
}

/// Randomness contributed by the participants themselves.
#[derive(Default)]
pub struct CommitRevealVrf {
    commitments: Vec<Commitment>,
    reveals: Vec<Reveal>,
}

impl CommitRevealVrf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a commitment. Commitments close with the first reveal.
    pub fn record_commitment(&mut self, commitment: Commitment) -> Result<(), VrfError> {
        if !self.reveals.is_empty() {
            return Err(VrfError::CommitReveal(
                "commitments are closed once reveals begin".into(),
            ));
        }
        if self
            .commitments
            .iter()
            .any(|c| c.participant == commitment.participant)
        {
            return Err(VrfError::CommitReveal(format!(
                "{} has already committed",
                commitment.participant
            )));
        }
        debug!(participant = %commitment.participant, "commitment recorded");
        self.commitments.push(commitment);
        Ok(())
    }

    /// Record a reveal and check it matches the participant's commitment.
    pub fn record_reveal(&mut self, reveal: Reveal) -> Result<(), VrfError> {
        let commitment = self
            .commitments
            .iter()
            .find(|c| c.participant == reveal.participant)
            .ok_or_else(|| {
                VrfError::CommitReveal(format!("{} never committed", reveal.participant))
            })?;
        if self
            .reveals
            .iter()
            .any(|r| r.participant == reveal.participant)
        {
            return Err(VrfError::CommitReveal(format!(
                "{} has already revealed",
                reveal.participant
            )));
        }
        if commitment_hash(&reveal.participant, &reveal.value) != commitment.hash {
            return Err(VrfError::VerificationFailed(format!(
                "reveal from {} does not match its commitment",
                reveal.participant
            )));
        }
        debug!(participant = %reveal.participant, "reveal accepted");
        self.reveals.push(reveal);
        Ok(())
    }

    /// Number of participants still to reveal.
    pub fn pending_reveals(&self) -> usize {
        self.commitments.len() - self.reveals.len()
    }

    /// Reveal values ordered by participant address.
    fn ordered_reveals(&self) -> Vec<&Reveal> {
        let mut ordered: Vec<&Reveal> = self.reveals.iter().collect();
        ordered.sort_by(|a, b| a.participant.cmp(&b.participant));
        ordered
    }

    /// Combine all reveals into a single random seed.
    ///
    /// Fails until every committed participant has revealed.
    pub fn combine_reveals(&self) -> Result<[u8; 32], VrfError> {
        if self.commitments.is_empty() {
            return Err(VrfError::Unavailable("no commitments recorded".into()));
        }
        if self.pending_reveals() > 0 {
            return Err(VrfError::Unavailable(format!(
                "{} of {} participants have not revealed",
                self.pending_reveals(),
                self.commitments.len()
            )));
        }
        Ok(combine(self.ordered_reveals().iter().map(|r| &r.value)))
    }
}

fn combine<'a>(values: impl Iterator<Item = &'a [u8; 32]>) -> [u8; 32] {
    let mut data = DOMAIN.to_vec();
    for value in values {
        data.extend_from_slice(value);
    }
    blake2b_256(&data)
}

impl VrfProvider for CommitRevealVrf {
    fn get_randomness(&self, context: &[u8]) -> Result<RandomOutput, VrfError> {
        let seed = self.combine_reveals()?;
        let proof: Vec<u8> = self
            .ordered_reveals()
            .iter()
            .flat_map(|r| r.value.iter().copied())
            .collect();
        Ok(RandomOutput {
            value: blake2b_256_multi(&[&seed, context]),
            proof,
            round: self.reveals.len() as u64,
        })
    }

    fn verify(&self, context: &[u8], output: &RandomOutput) -> Result<bool, VrfError> {
        if output.proof.len() % 32 != 0 {
            return Err(VrfError::InvalidProof);
        }
        let ordered = self.ordered_reveals();
        if output.proof.len() / 32 != ordered.len() {
            return Ok(false);
        }
        let proof_matches = output
            .proof
            .chunks_exact(32)
            .zip(&ordered)
            .all(|(chunk, reveal)| chunk == reveal.value.as_slice());
        if !proof_matches {
            return Ok(false);
        }
        let seed = self.combine_reveals()?;
        Ok(output.value == blake2b_256_multi(&[&seed, context]))
    }

    fn name(&self) -> &str {
        "commit-reveal"
    }
}
