//! Logging setup for Ergon services.
//!
//! Ergon crates emit events through `tracing` with structured fields
//! (`method`, `path`, `request_id`, `stage`, `status`). This crate installs
//! the subscriber that formats them.

#![doc(html_root_url = "https://docs.rs/ergon-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
