//! Nullable random: deterministic randomness for lottery tests.

use fixinsured_vrf::{RandomOutput, VrfError, VrfProvider};
use std::sync::Mutex;

/// A deterministic randomness provider for testing.
///
/// Returns pre-configured values in order, cycling when exhausted. An
/// unavailable provider fails every request, like a beacon that has not
/// been published yet.
pub struct NullRandom {
    outputs: Vec<[u8; 32]>,
    index: Mutex<usize>,
    contexts: Mutex<Vec<Vec<u8>>>,
}

impl NullRandom {
    /// Create with a sequence of deterministic random values.
    pub fn new(outputs: Vec<[u8; 32]>) -> Self {
        Self {
            outputs,
            index: Mutex::new(0),
            contexts: Mutex::new(Vec::new()),
        }
    }

    /// Create with a single value that will be returned for every call.
    pub fn constant(value: [u8; 32]) -> Self {
        Self::new(vec![value])
    }

    /// A provider that never has randomness available.
    pub fn unavailable() -> Self {
        Self::new(Vec::new())
    }

    /// Contexts passed to `get_randomness`, in call order.
    pub fn requested_contexts(&self) -> Vec<Vec<u8>> {
        self.contexts
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

impl VrfProvider for NullRandom {
    fn get_randomness(&self, context: &[u8]) -> Result<RandomOutput, VrfError> {
        if self.outputs.is_empty() {
            return Err(VrfError::Unavailable("null provider has no outputs".into()));
        }
        let mut idx = self
            .index
            .lock()
            .map_err(|_| VrfError::Unavailable("null provider poisoned".into()))?;
        if let Ok(mut contexts) = self.contexts.lock() {
            contexts.push(context.to_vec());
        }
        let current = *idx % self.outputs.len();
        *idx += 1;
        Ok(RandomOutput {
            value: self.outputs[current],
            proof: Vec::new(),
            round: current as u64,
        })
    }

    fn verify(&self, _context: &[u8], output: &RandomOutput) -> Result<bool, VrfError> {
        Ok(self.outputs.contains(&output.value))
    }

    fn name(&self) -> &str {
        "null-random"
    }
}
