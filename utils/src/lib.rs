//! Shared utilities for FIXInsured.

pub mod logging;
pub mod time;

pub use logging::{init_logging, init_tracing, LogFormat, LoggingError};
pub use time::{format_deadline, format_duration};
