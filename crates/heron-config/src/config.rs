//! Configuration sections.

use crate::ConfigError;
use heron_telemetry::LogConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete Heron service configuration.
///
/// Every section falls back to its defaults when absent, but unknown keys are
/// rejected at every level.
///
/// # Example
///
/// ```
/// use heron_config::HeronConfig;
///
/// let config = HeronConfig::default();
/// assert_eq!(config.pipeline.max_body_bytes, 1024 * 1024);
/// assert!(config.pipeline.convert_underscores);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct HeronConfig {
    /// Request pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LogConfig,

    /// Service identity.
    #[serde(default)]
    pub service: ServiceConfig,
}

/// Request pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Largest accepted request body. Larger bodies get 413.
    pub max_body_bytes: usize,

    /// Whether header parameters map `user_agent` to `user-agent`.
    pub convert_underscores: bool,

    /// Whether 500 responses name the fault.
    pub expose_fault_detail: bool,

    /// Per-request deadline covering resolution and the handler. `None`
    /// disables it.
    pub request_timeout_ms: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 1024 * 1024,
            convert_underscores: true,
            expose_fault_detail: false,
            request_timeout_ms: Some(30_000),
        }
    }
}

impl PipelineConfig {
    /// The request deadline as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

/// Service identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Service name, stamped on log output.
    pub name: String,

    /// Deployment environment, e.g. `development` or `production`.
    pub environment: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "heron".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl HeronConfig {
    /// Checks cross-field constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "pipeline.max_body_bytes",
                "must be greater than 0",
            ));
        }
        if self.pipeline.request_timeout_ms == Some(0) {
            return Err(ConfigError::invalid_value(
                "pipeline.request_timeout_ms",
                "must be greater than 0; omit it to disable the timeout",
            ));
        }
        if self.service.name.trim().is_empty() {
            return Err(ConfigError::invalid_value("service.name", "must not be empty"));
        }
        if self.service.environment.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "service.environment",
                "must not be empty",
            ));
        }
        self.logging_config().validate()?;
        Ok(())
    }

    /// Logging settings with the service name applied.
    #[must_use]
    pub fn logging_config(&self) -> LogConfig {
        LogConfig {
            service_name: self.service.name.clone(),
            ..self.logging.clone()
        }
    }

    /// Pretty debug logging and exposed fault details.
    #[must_use]
    pub fn development() -> Self {
        Self {
            pipeline: PipelineConfig {
                expose_fault_detail: true,
                ..PipelineConfig::default()
            },
            logging: LogConfig::development(),
            service: ServiceConfig::default(),
        }
    }

    /// JSON logging and opaque faults.
    #[must_use]
    pub fn production() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            logging: LogConfig::production(),
            service: ServiceConfig {
                environment: "production".to_string(),
                ..ServiceConfig::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HeronConfig::default();
        assert_eq!(config.pipeline.request_timeout(), Some(Duration::from_secs(30)));
        assert!(!config.pipeline.expose_fault_detail);
        assert_eq!(config.service.name, "heron");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let dev = HeronConfig::development();
        assert!(dev.pipeline.expose_fault_detail);
        assert_eq!(dev.logging.level, "debug");
        assert!(!dev.logging.json_format);

        let prod = HeronConfig::production();
        assert!(!prod.pipeline.expose_fault_detail);
        assert!(prod.logging.json_format);
        assert_eq!(prod.service.environment, "production");
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut config = HeronConfig::default();
        config.pipeline.max_body_bytes = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_body_bytes"));

        let mut config = HeronConfig::default();
        config.pipeline.request_timeout_ms = Some(0);
        assert!(config.validate().unwrap_err().to_string().contains("request_timeout_ms"));

        config.pipeline.request_timeout_ms = None;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_logging_section() {
        let mut config = HeronConfig::default();
        config.logging.level = "heron=verbose".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Logging(_))));
    }

    #[test]
    fn test_logging_config_takes_service_name() {
        let mut config = HeronConfig::default();
        config.service.name = "items-api".to_string();
        assert_eq!(config.logging_config().service_name, "items-api");
    }

    #[test]
    fn test_toml_round_trip_shape() {
        let text = toml::to_string_pretty(&HeronConfig::default()).unwrap();
        assert!(text.contains("[pipeline]"));
        assert!(text.contains("[logging]"));
        assert!(text.contains("[service]"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let text = r#"
            [pipeline]
            max_body_bytes = 10
            max_depth = 3
        "#;
        assert!(toml::from_str::<HeronConfig>(text).is_err());
        assert!(toml::from_str::<HeronConfig>("[server]\nport = 1").is_err());
    }
}
