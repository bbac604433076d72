//! Abstract storage for policy snapshots.
//!
//! The hosting ledger owns the persisted layout. Hosts implement
//! [`PolicyStore`] over whatever backend they have; tests use the in-memory
//! store from `fixinsured-nullables`.

pub mod error;
pub mod policy;

pub use error::StoreError;
pub use policy::PolicyStore;
