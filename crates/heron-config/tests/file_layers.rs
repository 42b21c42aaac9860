//! Loading configuration from files on disk.

use heron_config::{ConfigError, ConfigLoader, HeronConfig};
use std::io::Write;
use tempfile::{Builder, TempDir};

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

// ============================================================================
// Files
// ============================================================================

#[test]
fn test_toml_file() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "heron.toml",
        r#"
            [pipeline]
            max_body_bytes = 4096
            expose_fault_detail = true

            [service]
            name = "items-api"
        "#,
    );

    let config = ConfigLoader::new().with_file(&path).unwrap().load_from(Vec::new()).unwrap();
    assert_eq!(config.pipeline.max_body_bytes, 4096);
    assert!(config.pipeline.expose_fault_detail);
    assert!(config.pipeline.convert_underscores);
    assert_eq!(config.service.name, "items-api");
    assert_eq!(config.logging_config().service_name, "items-api");
}

#[test]
fn test_json_file() {
    let mut file = Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(br#"{"logging": {"level": "debug", "json_format": false}}"#)
        .unwrap();

    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .load_from(Vec::new())
        .unwrap();
    assert_eq!(config.logging.level, "debug");
    assert!(!config.logging.json_format);
}

#[test]
fn test_later_files_win() {
    let dir = TempDir::new().unwrap();
    let base = write(&dir, "base.toml", "[pipeline]\nmax_body_bytes = 100\nexpose_fault_detail = true\n");
    let local = write(&dir, "local.json", r#"{"pipeline": {"max_body_bytes": 200}}"#);

    let config = ConfigLoader::new()
        .with_file(&base)
        .unwrap()
        .with_optional_file(&local)
        .unwrap()
        .load_from(Vec::new())
        .unwrap();
    assert_eq!(config.pipeline.max_body_bytes, 200);
    assert!(config.pipeline.expose_fault_detail);
}

#[test]
fn test_file_errors() {
    let dir = TempDir::new().unwrap();

    let unknown = write(&dir, "bad.toml", "[pipeline]\nworkers = 4\n");
    assert!(matches!(
        ConfigLoader::new().with_file(&unknown),
        Err(ConfigError::TomlError(_))
    ));

    let yaml = write(&dir, "heron.yaml", "pipeline: {}\n");
    assert!(matches!(
        ConfigLoader::new().with_file(&yaml),
        Err(ConfigError::UnsupportedFormat(_))
    ));

    let broken = write(&dir, "broken.json", "{\"pipeline\": ");
    assert!(matches!(
        ConfigLoader::new().with_optional_file(&broken),
        Err(ConfigError::JsonError(_))
    ));
}

// ============================================================================
// Dotenv
// ============================================================================

#[test]
fn test_dotenv_file_layer() {
    let dir = TempDir::new().unwrap();
    let dotenv = write(
        &dir,
        ".env",
        "HERON__SERVICE__ENVIRONMENT=staging\nHERON__LOGGING__LEVEL=debug\n",
    );

    let config = ConfigLoader::new()
        .with_dotenv_file(&dotenv)
        .unwrap()
        .with_env()
        .load_from(vec![("HERON__LOGGING__LEVEL".to_string(), "warn".to_string())])
        .unwrap();

    assert_eq!(config.service.environment, "staging");
    assert_eq!(config.logging.level, "warn");
}

#[test]
fn test_dotenv_file_missing() {
    let result = ConfigLoader::new().with_dotenv_file("/nonexistent/.env");
    assert!(matches!(result, Err(ConfigError::DotenvError(_))));
}

#[test]
fn test_file_then_env() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "heron.toml", "[pipeline]\nrequest_timeout_ms = 500\n");

    let config = ConfigLoader::new()
        .with_file(&path)
        .unwrap()
        .with_env()
        .load_from(vec![(
            "HERON__PIPELINE__REQUEST_TIMEOUT_MS".to_string(),
            "750".to_string(),
        )])
        .unwrap();

    assert_eq!(config.pipeline.request_timeout_ms, Some(750));
    assert_ne!(config, HeronConfig::default());
}
