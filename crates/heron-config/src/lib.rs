//! Typed configuration for Heron services.
//!
//! [`HeronConfig`] has three sections, each optional in a file and each
//! strict about unknown keys:
//!
//! | Section | Type | Covers |
//! |---------|------|--------|
//! | `pipeline` | [`PipelineConfig`] | body limit, header underscore conversion, fault detail, request timeout |
//! | `logging` | [`LogConfig`] | level, format, fields |
//! | `service` | [`ServiceConfig`] | name, environment |
//!
//! [`ConfigLoader`] layers defaults, TOML/JSON files, `.env` entries, and
//! `HERON__SECTION__KEY` environment variables, then validates.
//!
//! # Example
//!
//! ```no_run
//! use heron_config::ConfigLoader;
//!
//! # fn main() -> Result<(), heron_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("heron.toml")?
//!     .with_dotenv()?
//!     .with_env()
//!     .load()?;
//!
//! heron_telemetry::init_logging(&config.logging_config())?;
//! # Ok(())
//! # }
//! ```
//!
//! # File Format
//!
//! ```toml
//! [pipeline]
//! max_body_bytes = 1048576
//! convert_underscores = true
//! expose_fault_detail = false
//! request_timeout_ms = 30000
//!
//! [logging]
//! level = "info"
//! json_format = true
//!
//! [service]
//! name = "items-api"
//! environment = "production"
//! ```

#![doc(html_root_url = "https://docs.rs/heron-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;

pub use config::{HeronConfig, PipelineConfig, ServiceConfig};
pub use error::ConfigError;
pub use heron_telemetry::LogConfig;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
