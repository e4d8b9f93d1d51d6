//! Bucket resolution: one bucket per project, named `{project_id}-{project_name}`.

use tracing::{debug, info};

use crate::contract::{BackendError, SharedStore};
use crate::error::{Result, StoreError};

/// A resolved, existing bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    name: String,
}

impl Bucket {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Deterministic bucket name for a project.
pub fn bucket_name(project_id: u64, project_name: &str) -> String {
    format!("{project_id}-{project_name}")
}

/// Looks up and creates project buckets.
#[derive(Clone)]
pub struct BucketResolver {
    store: SharedStore,
}

impl BucketResolver {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Name of the bucket for a project.
    pub fn resolve(&self, project_id: u64, project_name: &str) -> String {
        bucket_name(project_id, project_name)
    }

    /// Return the bucket, creating it if absent.
    ///
    /// A concurrent creator winning the race (`Conflict`) counts as success.
    pub async fn ensure_exists(&self, bucket: &str) -> Result<Bucket> {
        let exists = self
            .store
            .bucket_exists(bucket)
            .await
            .map_err(|e| StoreError::from_backend(bucket, e))?;
        if exists {
            debug!(bucket, "Bucket exists");
            return Ok(Bucket {
                name: bucket.to_string(),
            });
        }

        info!(bucket, "Bucket not found, creating it");
        match self.store.create_bucket(bucket).await {
            Ok(()) => info!(bucket, "Bucket created"),
            Err(BackendError::Conflict) => {
                info!(bucket, "Bucket created concurrently by another caller")
            }
            Err(e) => return Err(StoreError::from_backend(bucket, e)),
        }
        Ok(Bucket {
            name: bucket.to_string(),
        })
    }

    /// Return the bucket only if it already exists.
    pub async fn lookup(&self, bucket: &str) -> Result<Bucket> {
        let exists = self
            .store
            .bucket_exists(bucket)
            .await
            .map_err(|e| StoreError::from_backend(bucket, e))?;
        if !exists {
            return Err(StoreError::BucketNotFound(bucket.to_string()));
        }
        Ok(Bucket {
            name: bucket.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::contract::MockObjectStore;

    #[test]
    fn bucket_name_joins_id_and_name() {
        assert_eq!(bucket_name(42, "demo-project"), "42-demo-project");
    }

    #[tokio::test]
    async fn ensure_exists_treats_conflict_as_success() {
        let mut store = MockObjectStore::new();
        store.expect_bucket_exists().returning(|_| Ok(false));
        store
            .expect_create_bucket()
            .times(1)
            .returning(|_| Err(BackendError::Conflict));

        let resolver = BucketResolver::new(Arc::new(store));
        let bucket = resolver.ensure_exists("42-demo").await.unwrap();
        assert_eq!(bucket.name(), "42-demo");
    }

    #[tokio::test]
    async fn ensure_exists_does_not_create_existing_bucket() {
        let mut store = MockObjectStore::new();
        store.expect_bucket_exists().returning(|_| Ok(true));
        store.expect_create_bucket().never();

        let resolver = BucketResolver::new(Arc::new(store));
        assert!(resolver.ensure_exists("42-demo").await.is_ok());
    }

    #[tokio::test]
    async fn lookup_reports_missing_bucket() {
        let mut store = MockObjectStore::new();
        store.expect_bucket_exists().returning(|_| Ok(false));

        let resolver = BucketResolver::new(Arc::new(store));
        let err = resolver.lookup("42-demo").await.unwrap_err();
        assert!(matches!(err, StoreError::BucketNotFound(ref b) if b == "42-demo"));
    }

    #[tokio::test]
    async fn permission_denied_surfaces_as_storage_access() {
        let mut store = MockObjectStore::new();
        store
            .expect_bucket_exists()
            .returning(|_| Err(BackendError::PermissionDenied("403 Forbidden".into())));

        let resolver = BucketResolver::new(Arc::new(store));
        let err = resolver.ensure_exists("42-demo").await.unwrap_err();
        assert!(matches!(err, StoreError::StorageAccess { .. }));
    }
}
