//! # contract: interface to the backing object store
//!
//! This module defines the single trait ([`ObjectStore`]) every storage backend implements,
//! together with the plain data and error types that cross it. Components in this crate only
//! ever talk to storage through this trait, so production clients (GCS, filesystem) and test
//! doubles are interchangeable.
//!
//! ## Interface & Extensibility
//! - All I/O methods are async; each call is single-shot. Backends must not retry internally.
//! - Errors are reported as [`BackendError`], a closed set of outcomes the components branch on
//!   (definitive not-found vs. conflict vs. transient). Do not smuggle those through `Other`.
//! - `put_object` is create-or-replace.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall` so tests can script failure branches (vanished
//!   sources, permission errors) that are awkward to produce with a real backend.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

#[allow(unused_imports)]
use mockall::{automock, predicate::*};

/// Listing entry returned by [`ObjectStore::list_objects`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Full object name, including any folder prefix.
    pub name: String,
}

impl ObjectInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Final path segment of the object name.
    pub fn basename(&self) -> &str {
        basename(&self.name)
    }
}

/// Final slash-delimited segment of an object name.
pub fn basename(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Outcome classes a backing store reports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The bucket or object does not exist.
    #[error("not found")]
    NotFound,
    /// The bucket or object already exists (or a precondition failed).
    #[error("conflict")]
    Conflict,
    /// Credentials were rejected or lack permission.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// Timeout, connectivity failure or a retryable server status.
    #[error("transient failure: {0}")]
    Transient(String),
    /// Any other backend failure.
    #[error("{0}")]
    Other(String),
}

/// Trait for the object store holding one bucket per project.
///
/// Implemented by real clients and by test mocks. Object names are slash-delimited; folders
/// are name prefixes only.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Whether the bucket exists.
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, BackendError>;

    /// Create the bucket. Returns [`BackendError::Conflict`] if it already exists.
    async fn create_bucket(&self, bucket: &str) -> Result<(), BackendError>;

    /// List objects whose name starts with `prefix`, in the store's own order.
    async fn list_objects(&self, bucket: &str, prefix: &str)
        -> Result<Vec<ObjectInfo>, BackendError>;

    /// Fetch an object's bytes.
    async fn get_object(&self, bucket: &str, name: &str) -> Result<Vec<u8>, BackendError>;

    /// Create or replace an object.
    async fn put_object(
        &self,
        bucket: &str,
        name: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError>;

    /// Whether the named object exists.
    async fn object_exists(&self, bucket: &str, name: &str) -> Result<bool, BackendError>;

    /// Server-side rename. Returns the new name; [`BackendError::NotFound`] if `source` is gone.
    async fn rename_object(
        &self,
        bucket: &str,
        source: &str,
        destination: &str,
    ) -> Result<String, BackendError>;

    /// Display URI for an object (e.g. `gs://bucket/name`).
    fn object_uri(&self, bucket: &str, name: &str) -> String;
}

/// Shared, explicitly-owned handle to a backing store.
pub type SharedStore = Arc<dyn ObjectStore>;
