//! Layered configuration loading.

use crate::{ConfigError, HeronConfig};
use serde_json::Value;
use std::env;
use std::fs;
use std::path::Path;

/// Environment prefix used by [`ConfigLoader::with_env`].
pub const DEFAULT_ENV_PREFIX: &str = "HERON";

/// Configuration loader with layered approach.
///
/// Layers apply in order, later ones overriding earlier ones field by field:
///
/// 1. Defaults (or a preset)
/// 2. Configuration files and strings (TOML or JSON)
/// 3. Variables from a `.env` file
/// 4. Process environment variables, `PREFIX__SECTION__KEY`
///
/// A `.env` entry never overrides a variable already set in the process
/// environment.
///
/// # Example
///
/// ```no_run
/// use heron_config::ConfigLoader;
///
/// # fn main() -> Result<(), heron_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("heron.toml")?
///     .with_dotenv()?
///     .with_env()
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: HeronConfig,
    env_prefix: Option<String>,
    dotenv: Vec<(String, String)>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// A loader starting from [`HeronConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: HeronConfig::default(),
            env_prefix: None,
            dotenv: Vec::new(),
        }
    }

    /// Start from the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = HeronConfig::development();
        self
    }

    /// Start from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = HeronConfig::production();
        self
    }

    /// Merges a configuration file over the current values.
    ///
    /// The format follows the extension, `.toml` or `.json`. Fields the file
    /// does not mention keep their current values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing or unreadable, has an
    /// unsupported extension, or does not parse (unknown fields included).
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

        self.with_string(&content, format)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Merges configuration text in `format` (`"toml"` or `"json"`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the format is unsupported or parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use heron_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[pipeline]\nmax_body_bytes = 4096", "toml")
    ///     .unwrap()
    ///     .load_unvalidated();
    ///
    /// assert_eq!(config.pipeline.max_body_bytes, 4096);
    /// assert!(config.pipeline.convert_underscores);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let document = match format.to_lowercase().as_str() {
            "toml" => {
                // Parse into the typed form first so unknown fields report
                // TOML positions.
                toml::from_str::<HeronConfig>(content)?;
                toml::from_str::<Value>(content)?
            }
            "json" => {
                serde_json::from_str::<HeronConfig>(content)?;
                serde_json::from_str::<Value>(content)?
            }
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };

        self.merge_document(document)?;
        Ok(self)
    }

    /// Read overrides from environment variables under `prefix`.
    ///
    /// With prefix `HERON`, `HERON__PIPELINE__MAX_BODY_BYTES=2048` sets
    /// `pipeline.max_body_bytes`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Read overrides from `HERON__*` environment variables.
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_env_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Reads `.env` from the working directory or its ancestors, if present.
    ///
    /// Entries are kept by the loader. The process environment is left
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DotenvError`] if a `.env` file exists but is
    /// malformed.
    pub fn with_dotenv(mut self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv_iter() {
            Ok(iter) => {
                for item in iter {
                    self.dotenv
                        .push(item.map_err(|e| ConfigError::DotenvError(e.to_string()))?);
                }
                Ok(self)
            }
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::DotenvError(e.to_string())),
        }
    }

    /// Reads a specific dotenv file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DotenvError`] if the file is missing or
    /// malformed.
    pub fn with_dotenv_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let iter = dotenvy::from_path_iter(path.as_ref())
            .map_err(|e| ConfigError::DotenvError(e.to_string()))?;
        for item in iter {
            self.dotenv
                .push(item.map_err(|e| ConfigError::DotenvError(e.to_string()))?);
        }
        Ok(self)
    }

    /// Applies environment overrides from the process and validates.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable does not parse, names an unknown
    /// field, or the result fails [`HeronConfig::validate`].
    pub fn load(self) -> Result<HeronConfig, ConfigError> {
        self.load_from(env::vars())
    }

    /// Like [`load`](Self::load), reading `vars` instead of the process
    /// environment.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn load_from<I>(mut self, vars: I) -> Result<HeronConfig, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        if let Some(prefix) = self.env_prefix.take() {
            let process: Vec<(String, String)> = vars.into_iter().collect();
            let dotenv = std::mem::take(&mut self.dotenv);
            let shadowed = |key: &str| process.iter().any(|(k, _)| k == key);

            for (key, value) in dotenv.iter().filter(|(k, _)| !shadowed(k)) {
                self.apply_env_var(key, value, &prefix)?;
            }
            for (key, value) in &process {
                self.apply_env_var(key, value, &prefix)?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Finish without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> HeronConfig {
        self.config
    }

    fn merge_document(&mut self, document: Value) -> Result<(), ConfigError> {
        let mut current = serde_json::to_value(&self.config)?;
        merge_values(&mut current, document);
        self.config = serde_json::from_value(current)?;
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(rest) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) else {
            return Ok(());
        };
        let parts: Vec<&str> = rest.split("__").collect();

        let pipeline = &mut self.config.pipeline;
        let logging = &mut self.config.logging;
        let service = &mut self.config.service;

        match parts.as_slice() {
            ["PIPELINE", "MAX_BODY_BYTES"] => {
                pipeline.max_body_bytes = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["PIPELINE", "CONVERT_UNDERSCORES"] => {
                pipeline.convert_underscores = parse_bool(key, value)?;
            }
            ["PIPELINE", "EXPOSE_FAULT_DETAIL"] => {
                pipeline.expose_fault_detail = parse_bool(key, value)?;
            }
            ["PIPELINE", "REQUEST_TIMEOUT_MS"] => {
                pipeline.request_timeout_ms = if value.is_empty() || value.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(value.parse().map_err(|_| {
                        ConfigError::env_parse_error(key, "expected integer or 'none'")
                    })?)
                };
            }

            ["LOGGING", "ENABLED"] => logging.enabled = parse_bool(key, value)?,
            ["LOGGING", "LEVEL"] => logging.level = value.to_string(),
            ["LOGGING", "JSON_FORMAT"] => logging.json_format = parse_bool(key, value)?,
            ["LOGGING", "FILE_LINE_INFO"] => logging.file_line_info = parse_bool(key, value)?,
            ["LOGGING", "INCLUDE_TARGET"] => logging.include_target = parse_bool(key, value)?,
            ["LOGGING", "SERVICE_NAME"] => logging.service_name = value.to_string(),

            ["SERVICE", "NAME"] => service.name = value.to_string(),
            ["SERVICE", "ENVIRONMENT"] => service.environment = value.to_string(),

            [section, field] => {
                return Err(ConfigError::unknown_field(
                    field.to_lowercase(),
                    section.to_lowercase(),
                ))
            }
            _ => return Err(ConfigError::env_parse_error(key, "expected PREFIX__SECTION__KEY")),
        }

        Ok(())
    }
}

fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_values(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env_parse_error(key, "expected boolean")),
    }
}
