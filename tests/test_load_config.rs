use std::env;
use std::fs::write;
use std::path::PathBuf;

use codeclarity::load_config::{
    load_config, BackendKind, DEFAULT_GCS_ENDPOINT, DEFAULT_TIMEOUT_SECS, DEFAULT_WORKER_THREADS,
    GCS_TOKEN_ENV,
};
use serial_test::serial;
use tempfile::NamedTempFile;

fn config_file(yaml: &str) -> NamedTempFile {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), yaml).unwrap();
    config_file
}

/// A filesystem config loads with defaults applied and the project section parsed.
#[tokio::test]
#[serial]
async fn test_load_config_success_applies_defaults() {
    let config_file = config_file(
        r#"
storage:
  backend: filesystem
  root: ./tmp/buckets
project:
  id: 42
  name: demo
"#,
    );

    let config = load_config(config_file.path()).expect("Config should load");

    assert_eq!(config.storage.backend, BackendKind::Filesystem);
    assert_eq!(config.storage.root, Some(PathBuf::from("./tmp/buckets")));
    assert_eq!(config.storage.endpoint, DEFAULT_GCS_ENDPOINT);
    assert_eq!(config.storage.timeout_secs, DEFAULT_TIMEOUT_SECS);
    assert_eq!(config.storage.worker_threads, DEFAULT_WORKER_THREADS);
    let project = config.project.expect("project section");
    assert_eq!(project.bucket_name(), "42-demo");
    assert!(config.access_token.is_none());
}

/// The GCS token is read from the environment, never the file.
#[tokio::test]
#[serial]
async fn test_load_config_injects_gcs_token_from_env() {
    let config_file = config_file(
        r#"
storage:
  backend: gcs
  gcp_project: my-gcp-project
  timeout_secs: 5
"#,
    );
    env::set_var(GCS_TOKEN_ENV, "ya29.test-token");

    let config = load_config(config_file.path()).expect("Config should load");
    env::remove_var(GCS_TOKEN_ENV);

    assert_eq!(config.storage.backend, BackendKind::Gcs);
    assert_eq!(config.storage.gcp_project.as_deref(), Some("my-gcp-project"));
    assert_eq!(config.storage.timeout_secs, 5);
    assert_eq!(config.access_token.as_deref(), Some("ya29.test-token"));
    assert!(config.project.is_none());
}

/// A gcs backend without the token env var fails to load.
#[tokio::test]
#[serial]
async fn test_load_config_errors_on_missing_token() {
    let config_file = config_file("storage:\n  backend: gcs\n");
    env::remove_var(GCS_TOKEN_ENV);

    let err = load_config(config_file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains(GCS_TOKEN_ENV), "Must error for missing env var, got: {msg}");
}

#[tokio::test]
#[serial]
async fn test_load_config_errors_for_unknown_backend() {
    let config_file = config_file("storage:\n  backend: ftp\n");

    let err = load_config(config_file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("parse") || msg.contains("YAML"), "Parse error expected, got: {msg}");
}

#[tokio::test]
#[serial]
async fn test_load_config_errors_for_invalid_file() {
    let config_file = config_file("not-yaml: [:::");

    let err = load_config(config_file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("parse") || msg.contains("YAML"), "Parse error expected, got: {msg}");
}

#[tokio::test]
#[serial]
async fn test_load_config_requires_root_for_filesystem() {
    let config_file = config_file("storage:\n  backend: filesystem\n");

    let err = load_config(config_file.path()).unwrap_err();
    assert!(err.to_string().contains("storage.root"));
}

#[tokio::test]
#[serial]
async fn test_load_config_rejects_zero_timeout() {
    let config_file = config_file("storage:\n  backend: memory\n  timeout_secs: 0\n");

    let err = load_config(config_file.path()).unwrap_err();
    assert!(err.to_string().contains("timeout_secs"));
}

#[tokio::test]
#[serial]
async fn test_load_config_errors_for_missing_file() {
    let err = load_config("/nonexistent/codeclarity.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
