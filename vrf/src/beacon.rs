//! Beacon provider: randomness from a value no participant controls.

use crate::{RandomOutput, VrfError, VrfProvider};
use fixinsured_crypto::blake2b_256_multi;

const DOMAIN: &[u8] = b"fixinsured/beacon";

/// Derives randomness from an external beacon value.
///
/// The output is `Blake2b(domain || beacon || context)`, so the same beacon
/// yields unrelated values for different policies.
pub struct BeaconVrf {
    beacon: [u8; 32],
    round: u64,
}

impl BeaconVrf {
    pub fn new(beacon: [u8; 32], round: u64) -> Self {
        Self { beacon, round }
    }

    fn derive(&self, context: &[u8]) -> [u8; 32] {
        blake2b_256_multi(&[DOMAIN, &self.beacon, context])
    }
}

impl VrfProvider for BeaconVrf {
    fn get_randomness(&self, context: &[u8]) -> Result<RandomOutput, VrfError> {
        Ok(RandomOutput {
            value: self.derive(context),
            proof: self.beacon.to_vec(),
            round: self.round,
        })
    }

    fn verify(&self, context: &[u8], output: &RandomOutput) -> Result<bool, VrfError> {
        if output.proof.as_slice() != self.beacon.as_slice() {
            return Ok(false);
        }
        Ok(output.round == self.round && output.value == self.derive(context))
    }

    fn name(&self) -> &str {
        "beacon"
    }
}
