/// `load_config` module: loads a static YAML config and injects secrets from the environment.
///
/// This is the only place where user-supplied YAML is parsed and mapped to typed settings.
///
/// # Responsibilities
/// - Parse the config file into [`CliConfig`]
/// - Apply defaults (timeout, worker pool size, GCS endpoint) and reject nonsensical values
/// - Read secrets (`GCS_ACCESS_TOKEN`) from the environment, never from the file
///
/// # Errors
/// All errors use `anyhow::Error` with enough context to be shown to CLI users as-is.
use anyhow::{bail, Result};
use codeclarity_core::request::ProjectRef;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Env var holding the OAuth2 bearer token for the GCS backend.
pub const GCS_TOKEN_ENV: &str = "GCS_ACCESS_TOKEN";

pub const DEFAULT_GCS_ENDPOINT: &str = "https://storage.googleapis.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_WORKER_THREADS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Gcs,
    Filesystem,
    /// Process-local and empty on every start: nothing persists between invocations, so
    /// it only suits single-command smoke runs (e.g. checking config and argument wiring).
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSection {
    pub backend: BackendKind,
    /// Root directory for the filesystem backend.
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// GCP project that owns newly created buckets.
    #[serde(default)]
    pub gcp_project: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
}

fn default_endpoint() -> String {
    DEFAULT_GCS_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_worker_threads() -> usize {
    DEFAULT_WORKER_THREADS
}

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub storage: StorageSection,
    pub project: Option<ProjectRef>,
    /// Bearer token for GCS, from the environment.
    pub access_token: Option<String>,
}

/// Loads a static YAML config file (no secrets) and injects required env vars for secrets.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    #[derive(Debug, Deserialize)]
    struct RawConfig {
        storage: StorageSection,
        #[serde(default)]
        project: Option<ProjectRef>,
    }

    let raw: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let storage = raw.storage;
    if storage.timeout_secs == 0 {
        bail!("storage.timeout_secs must be greater than zero");
    }
    if storage.worker_threads == 0 {
        bail!("storage.worker_threads must be greater than zero");
    }
    if storage.backend == BackendKind::Filesystem && storage.root.is_none() {
        bail!("storage.root is required for the filesystem backend");
    }

    let access_token = match storage.backend {
        BackendKind::Gcs => match std::env::var(GCS_TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => {
                info!("{GCS_TOKEN_ENV} found in env");
                Some(token)
            }
            Ok(_) | Err(_) => {
                error!("{GCS_TOKEN_ENV} environment variable not set");
                bail!("{GCS_TOKEN_ENV} environment variable not set (required for the gcs backend)");
            }
        },
        BackendKind::Filesystem | BackendKind::Memory => None,
    };

    info!(
        backend = ?storage.backend,
        timeout_secs = storage.timeout_secs,
        worker_threads = storage.worker_threads,
        project = ?raw.project,
        "Config loaded"
    );

    Ok(CliConfig {
        storage,
        project: raw.project,
        access_token,
    })
}
