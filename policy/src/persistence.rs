//! Snapshot encoding and storage of policies.
//!
//! Snapshots are bincode-encoded. Queued events are not persisted; queued
//! transfers are, so a restart never loses an owed payment.

use crate::error::PolicyError;
use crate::policy::Policy;
use fixinsured_store::{PolicyStore, StoreError};
use fixinsured_types::PolicyId;
use tracing::debug;

impl Policy {
    pub fn to_bytes(&self) -> Result<Vec<u8>, PolicyError> {
        bincode::serialize(self)
            .map_err(|e| PolicyError::Store(StoreError::Serialization(e.to_string())))
    }

    /// Decode a snapshot, rejecting one whose escrow does not balance.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PolicyError> {
        let policy: Policy = bincode::deserialize(bytes)
            .map_err(|e| PolicyError::Store(StoreError::Serialization(e.to_string())))?;
        policy
            .escrow
            .check_invariant()
            .map_err(|e| PolicyError::Store(StoreError::Corruption(e.to_string())))?;
        Ok(policy)
    }

    pub fn save_to(&self, store: &dyn PolicyStore) -> Result<(), PolicyError> {
        let bytes = self.to_bytes()?;
        store.put_policy(&self.id, &bytes)?;
        debug!(policy = %self.id, state = %self.state, bytes = bytes.len(), "policy saved");
        Ok(())
    }

    pub fn load_from(store: &dyn PolicyStore, id: &PolicyId) -> Result<Self, PolicyError> {
        let policy = Self::from_bytes(&store.get_policy(id)?)?;
        if policy.id != *id {
            return Err(PolicyError::Store(StoreError::Corruption(format!(
                "snapshot under {id} holds policy {}",
                policy.id
            ))));
        }
        Ok(policy)
    }
}
