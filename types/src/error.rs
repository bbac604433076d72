//! Errors for parsing and validating fundamental types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("invalid flight date {0:?}: expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid policy parameters: {0}")]
    InvalidParams(String),

    #[error("config parse error: {0}")]
    Config(String),
}
