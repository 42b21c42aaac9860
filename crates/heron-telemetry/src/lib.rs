//! Logging setup for Heron services.
//!
//! Every Heron crate reports through `tracing`. This crate owns the
//! subscriber side:
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`LogConfig`] | Level, format, and field options (embedded in the service config) |
//! | [`init_logging`] | Installs the global JSON or pretty subscriber |
//! | [`fields`] | Standard field names |
//! | [`log_request_start!`], [`log_request_complete!`], [`log_request_error!`] | Request lifecycle events |
//!
//! # Levels used by the pipeline
//!
//! | Level | Events |
//! |-------|--------|
//! | `debug` | plan construction, per-dependency resolution, cleanup |
//! | `info` | request start and completion |
//! | `warn` | domain errors raised by dependencies |
//! | `error` | faults and response validation failures |
//!
//! # Example
//!
//! ```rust,ignore
//! use heron_telemetry::{init_logging, LogConfig};
//!
//! let config = LogConfig {
//!     level: "heron_deps=debug,info".to_string(),
//!     ..LogConfig::production()
//! };
//! init_logging(&config)?;
//! ```

#![doc(html_root_url = "https://docs.rs/heron-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

#[doc(hidden)]
pub mod __private {
    pub use tracing;
}
