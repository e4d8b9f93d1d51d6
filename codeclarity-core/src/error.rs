//! Error types for documentation storage operations.

use thiserror::Error;

use crate::contract::BackendError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by the document lifecycle components.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A read path expected an existing bucket and found none.
    #[error("Bucket '{0}' not found")]
    BucketNotFound(String),

    /// Permission or authentication failure talking to the object store.
    #[error("Permission denied for bucket '{bucket}': {message}")]
    StorageAccess { bucket: String, message: String },

    /// A named object expected to exist does not.
    #[error("Object '{name}' not found in bucket '{bucket}'")]
    ArtifactNotFound { bucket: String, name: String },

    /// Documentation for this commit already exists in the current release.
    #[error("Documentation for commit {0} already exists")]
    DuplicateDocumentation(String),

    /// No overlap between the requested commits and the stored documentation.
    #[error("No matching documentation found in bucket '{bucket}'")]
    NoMatchingDocumentation { bucket: String },

    /// A single relocation failed for a reason other than an earlier move.
    #[error("Failed to move '{source_name}' to '{destination}': {message}")]
    Relocation {
        source_name: String,
        destination: String,
        message: String,
    },

    /// Timeout or connectivity failure.
    #[error("Transient network error: {0}")]
    TransientNetwork(String),

    /// Any other object store API failure.
    #[error("Object store error on bucket '{bucket}': {message}")]
    Backend { bucket: String, message: String },

    /// Malformed request input (commit identity, release tag).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl StoreError {
    /// Map a backend failure on `bucket` to the component error taxonomy.
    ///
    /// `NotFound` is mapped to [`StoreError::Backend`] here; callers that know which object
    /// they asked for use [`StoreError::from_object_backend`] instead.
    pub fn from_backend(bucket: &str, err: BackendError) -> Self {
        match err {
            BackendError::PermissionDenied(message) => StoreError::StorageAccess {
                bucket: bucket.to_string(),
                message,
            },
            BackendError::Transient(message) => StoreError::TransientNetwork(message),
            other => StoreError::Backend {
                bucket: bucket.to_string(),
                message: other.to_string(),
            },
        }
    }

    /// Like [`StoreError::from_backend`], mapping `NotFound` to [`StoreError::ArtifactNotFound`].
    pub fn from_object_backend(bucket: &str, name: &str, err: BackendError) -> Self {
        match err {
            BackendError::NotFound => StoreError::ArtifactNotFound {
                bucket: bucket.to_string(),
                name: name.to_string(),
            },
            other => StoreError::from_backend(bucket, other),
        }
    }

    /// Whether retrying at a higher layer may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::TransientNetwork(_))
    }
}
