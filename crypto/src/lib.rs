//! Cryptographic primitives for FIXInsured.
//!
//! - **Keccak-256** for the claim commitment (the digest the insured publishes
//!   and every verifier recomputes from private records)
//! - **Blake2b** for internal derivations (lottery scores, commit-reveal, policy ids)

pub mod commitment;
pub mod hash;

pub use commitment::{commit, ClaimTuple, FIELD_SEPARATOR};
pub use hash::{blake2b_256, blake2b_256_multi, keccak256};
