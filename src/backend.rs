//! Builds the configured [`SharedStore`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use codeclarity_core::contract::SharedStore;
use codeclarity_core::memory::MemoryObjectStore;

use crate::fs_store::FsObjectStore;
use crate::gcs::GcsObjectStore;
use crate::load_config::{BackendKind, CliConfig};

pub fn build_store(config: &CliConfig) -> Result<SharedStore> {
    let storage = &config.storage;
    let timeout = Duration::from_secs(storage.timeout_secs);
    let store: SharedStore = match storage.backend {
        BackendKind::Gcs => {
            let token = config
                .access_token
                .clone()
                .context("GCS backend selected but no access token was loaded")?;
            Arc::new(GcsObjectStore::new(
                &storage.endpoint,
                token,
                storage.gcp_project.clone(),
                timeout,
            )?)
        }
        BackendKind::Filesystem => {
            let root = storage
                .root
                .clone()
                .context("filesystem backend selected but storage.root is not set")?;
            Arc::new(FsObjectStore::new(root, storage.worker_threads, timeout))
        }
        BackendKind::Memory => {
            tracing::warn!("Memory backend selected: objects are discarded when this command exits");
            Arc::new(MemoryObjectStore::new())
        }
    };
    tracing::info!(backend = ?storage.backend, "Object store ready");
    Ok(store)
}
