//! Verifier-side configuration, loaded from TOML.

use fixinsured_utils::LogFormat;
use fixinsured_verification::DEFAULT_TOLERANCE_BPS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("invalid config: {0}")]
    Parse(String),
}

/// Configuration for a verifier running the off-chain matching step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Private flight records, CSV or JSON by extension.
    #[serde(default)]
    pub dataset: Option<PathBuf>,

    /// Accepted deviation of ticket price from fixed loss, in basis points.
    #[serde(default = "default_tolerance_bps")]
    pub tolerance_bps: u32,

    /// The verifier's own address, used in logs.
    #[serde(default)]
    pub verifier: Option<String>,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_tolerance_bps() -> u32 {
    DEFAULT_TOLERANCE_BPS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            dataset: None,
            tolerance_bps: default_tolerance_bps(),
            verifier: None,
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl VerifierConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
