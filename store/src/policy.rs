//! Policy snapshot storage trait.

use crate::StoreError;
use fixinsured_types::PolicyId;

/// Persists serialized policy snapshots keyed by policy id.
pub trait PolicyStore {
    /// Store (or overwrite) the snapshot for a policy.
    fn put_policy(&self, id: &PolicyId, snapshot: &[u8]) -> Result<(), StoreError>;

    /// Load a snapshot. Fails with `NotFound` when absent.
    fn get_policy(&self, id: &PolicyId) -> Result<Vec<u8>, StoreError>;

    /// Whether a snapshot exists for this id.
    fn exists(&self, id: &PolicyId) -> Result<bool, StoreError>;

    /// Remove a snapshot. Removing an absent id is not an error.
    fn delete_policy(&self, id: &PolicyId) -> Result<(), StoreError>;

    /// All stored policy ids, in ascending order.
    fn policy_ids(&self) -> Result<Vec<PolicyId>, StoreError>;
}
