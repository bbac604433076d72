//! Nullable store: thread-safe in-memory policy storage for testing.

use fixinsured_store::{PolicyStore, StoreError};
use fixinsured_types::PolicyId;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// An in-memory policy store for testing.
///
/// `set_failing(true)` makes every call fail with a backend error.
#[derive(Default)]
pub struct NullPolicyStore {
    policies: Mutex<BTreeMap<PolicyId, Vec<u8>>>,
    failing: AtomicBool,
}

impl NullPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.policies.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn policies(&self) -> Result<MutexGuard<'_, BTreeMap<PolicyId, Vec<u8>>>, StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("null store set to fail".into()));
        }
        self.policies
            .lock()
            .map_err(|_| StoreError::Backend("null store poisoned".into()))
    }
}

impl PolicyStore for NullPolicyStore {
    fn put_policy(&self, id: &PolicyId, snapshot: &[u8]) -> Result<(), StoreError> {
        self.policies()?.insert(*id, snapshot.to_vec());
        Ok(())
    }

    fn get_policy(&self, id: &PolicyId) -> Result<Vec<u8>, StoreError> {
        self.policies()?
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn exists(&self, id: &PolicyId) -> Result<bool, StoreError> {
        Ok(self.policies()?.contains_key(id))
    }

    fn delete_policy(&self, id: &PolicyId) -> Result<(), StoreError> {
        self.policies()?.remove(id);
        Ok(())
    }

    fn policy_ids(&self) -> Result<Vec<PolicyId>, StoreError> {
        Ok(self.policies()?.keys().copied().collect())
    }
}
