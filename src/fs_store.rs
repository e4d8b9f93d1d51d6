//! Local filesystem [`ObjectStore`]: buckets are directories under a root, objects are files
//! at their slash-delimited names.
//!
//! Every filesystem call is blocking, so it runs on tokio's blocking pool. A semaphore caps
//! how many run at once (`worker_threads`) and each call is bounded by the configured
//! timeout; a timed-out call reports [`BackendError::Transient`].
//!
//! Content types are accepted but not persisted.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use codeclarity_core::contract::{BackendError, ObjectInfo, ObjectStore};
use tokio::sync::Semaphore;
use walkdir::WalkDir;

pub struct FsObjectStore {
    root: PathBuf,
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>, worker_threads: usize, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            permits: Arc::new(Semaphore::new(worker_threads.max(1))),
            timeout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run blocking filesystem work on the bounded pool.
    async fn offload<T, F>(&self, op: &'static str, work: F) -> Result<T, BackendError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, BackendError> + Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| BackendError::Other(e.to_string()))?;
        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            work()
        });
        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(BackendError::Other(format!("{op} task failed: {join_err}"))),
            Err(_) => {
                tracing::warn!(op, timeout = ?self.timeout, "Filesystem call timed out");
                Err(BackendError::Transient(format!(
                    "{op} timed out after {:?}",
                    self.timeout
                )))
            }
        }
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, BackendError> {
        validate_name(bucket)?;
        if bucket.contains('/') {
            return Err(BackendError::Other(format!("invalid bucket name '{bucket}'")));
        }
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, name: &str) -> Result<PathBuf, BackendError> {
        validate_name(name)?;
        Ok(self.bucket_dir(bucket)?.join(name))
    }
}

/// Reject names that would escape the bucket directory.
fn validate_name(name: &str) -> Result<(), BackendError> {
    let path = Path::new(name);
    let escapes = name.is_empty()
        || path
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
    if escapes {
        return Err(BackendError::Other(format!("invalid object name '{name}'")));
    }
    Ok(())
}

fn map_io(err: io::Error) -> BackendError {
    match err.kind() {
        io::ErrorKind::NotFound => BackendError::NotFound,
        io::ErrorKind::AlreadyExists => BackendError::Conflict,
        io::ErrorKind::PermissionDenied => BackendError::PermissionDenied(err.to_string()),
        _ => BackendError::Other(err.to_string()),
    }
}

fn ensure_parent(path: &Path) -> Result<(), BackendError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(map_io)?;
    }
    Ok(())
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, BackendError> {
        let dir = self.bucket_dir(bucket)?;
        self.offload("bucket_exists", move || Ok(dir.is_dir())).await
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), BackendError> {
        let dir = self.bucket_dir(bucket)?;
        let root = self.root.clone();
        self.offload("create_bucket", move || {
            std::fs::create_dir_all(&root).map_err(map_io)?;
            std::fs::create_dir(&dir).map_err(map_io)
        })
        .await
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<ObjectInfo>, BackendError> {
        let dir = self.bucket_dir(bucket)?;
        let prefix = prefix.to_string();
        self.offload("list_objects", move || {
            if !dir.is_dir() {
                return Err(BackendError::NotFound);
            }
            let mut names = Vec::new();
            for entry in WalkDir::new(&dir).min_depth(1) {
                let entry = entry.map_err(|e| BackendError::Other(e.to_string()))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let Ok(relative) = entry.path().strip_prefix(&dir) else {
                    continue;
                };
                let name = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if name.starts_with(&prefix) {
                    names.push(name);
                }
            }
            names.sort();
            Ok(names.into_iter().map(ObjectInfo::new).collect())
        })
        .await
    }

    async fn get_object(&self, bucket: &str, name: &str) -> Result<Vec<u8>, BackendError> {
        let path = self.object_path(bucket, name)?;
        self.offload("get_object", move || std::fs::read(&path).map_err(map_io))
            .await
    }

    async fn put_object(
        &self,
        bucket: &str,
        name: &str,
        content: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), BackendError> {
        let dir = self.bucket_dir(bucket)?;
        let path = self.object_path(bucket, name)?;
        self.offload("put_object", move || {
            if !dir.is_dir() {
                return Err(BackendError::NotFound);
            }
            ensure_parent(&path)?;
            std::fs::write(&path, content).map_err(map_io)
        })
        .await
    }

    async fn object_exists(&self, bucket: &str, name: &str) -> Result<bool, BackendError> {
        let path = self.object_path(bucket, name)?;
        self.offload("object_exists", move || Ok(path.is_file())).await
    }

    async fn rename_object(
        &self,
        bucket: &str,
        source: &str,
        destination: &str,
    ) -> Result<String, BackendError> {
        let from = self.object_path(bucket, source)?;
        let to = self.object_path(bucket, destination)?;
        let new_name = destination.to_string();
        self.offload("rename_object", move || {
            if !from.is_file() {
                return Err(BackendError::NotFound);
            }
            ensure_parent(&to)?;
            std::fs::rename(&from, &to).map_err(map_io)?;
            Ok(new_name)
        })
        .await
    }

    fn object_uri(&self, bucket: &str, name: &str) -> String {
        format!("file://{}/{bucket}/{name}", self.root.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_escaping_the_bucket_are_rejected() {
        assert!(validate_name("current_release/a.md").is_ok());
        assert!(validate_name("../etc/passwd").is_err());
        assert!(validate_name("/abs.md").is_err());
        assert!(validate_name("a/./b.md").is_ok());
        assert!(validate_name("").is_err());
    }

    #[test]
    fn io_kinds_map_to_backend_outcomes() {
        assert_eq!(map_io(io::Error::from(io::ErrorKind::NotFound)), BackendError::NotFound);
        assert_eq!(map_io(io::Error::from(io::ErrorKind::AlreadyExists)), BackendError::Conflict);
        assert!(matches!(
            map_io(io::Error::from(io::ErrorKind::PermissionDenied)),
            BackendError::PermissionDenied(_)
        ));
    }

    #[tokio::test]
    async fn slow_call_times_out_as_transient() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = FsObjectStore::new(dir.path(), 1, Duration::from_millis(20));

        let err = store
            .offload("slow_listing", || {
                std::thread::sleep(Duration::from_millis(500));
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::Transient(ref msg) if msg.contains("slow_listing")));
        let store_err = codeclarity_core::StoreError::from_backend("42-demo", err);
        assert!(store_err.is_transient());
    }
}
