//! In-memory [`ObjectStore`] for tests and throwaway runs.
//!
//! Buckets and objects live in ordered maps, so listings come back sorted by name the way
//! GCS returns them.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::contract::{BackendError, ObjectInfo, ObjectStore};

#[derive(Debug, Clone)]
struct StoredObject {
    content: Vec<u8>,
    content_type: String,
}

#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    buckets: Mutex<BTreeMap<String, BTreeMap<String, StoredObject>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content type recorded for an object, if it exists.
    pub fn content_type(&self, bucket: &str, name: &str) -> Option<String> {
        self.buckets
            .lock()
            .get(bucket)
            .and_then(|objects| objects.get(name))
            .map(|o| o.content_type.clone())
    }

    /// Every object name in a bucket, sorted.
    pub fn object_names(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .lock()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, BackendError> {
        Ok(self.buckets.lock().contains_key(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), BackendError> {
        let mut buckets = self.buckets.lock();
        if buckets.contains_key(bucket) {
            return Err(BackendError::Conflict);
        }
        buckets.insert(bucket.to_string(), BTreeMap::new());
        Ok(())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<ObjectInfo>, BackendError> {
        let buckets = self.buckets.lock();
        let objects = buckets.get(bucket).ok_or(BackendError::NotFound)?;
        Ok(objects
            .keys()
            .filter(|name| name.starts_with(prefix))
            .map(|name| ObjectInfo::new(name.clone()))
            .collect())
    }

    async fn get_object(&self, bucket: &str, name: &str) -> Result<Vec<u8>, BackendError> {
        let buckets = self.buckets.lock();
        buckets
            .get(bucket)
            .and_then(|objects| objects.get(name))
            .map(|o| o.content.clone())
            .ok_or(BackendError::NotFound)
    }

    async fn put_object(
        &self,
        bucket: &str,
        name: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError> {
        let mut buckets = self.buckets.lock();
        let objects = buckets.get_mut(bucket).ok_or(BackendError::NotFound)?;
        objects.insert(
            name.to_string(),
            StoredObject {
                content,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn object_exists(&self, bucket: &str, name: &str) -> Result<bool, BackendError> {
        Ok(self
            .buckets
            .lock()
            .get(bucket)
            .is_some_and(|objects| objects.contains_key(name)))
    }

    async fn rename_object(
        &self,
        bucket: &str,
        source: &str,
        destination: &str,
    ) -> Result<String, BackendError> {
        let mut buckets = self.buckets.lock();
        let objects = buckets.get_mut(bucket).ok_or(BackendError::NotFound)?;
        let object = objects.remove(source).ok_or(BackendError::NotFound)?;
        objects.insert(destination.to_string(), object);
        Ok(destination.to_string())
    }

    fn object_uri(&self, bucket: &str, name: &str) -> String {
        format!("memory://{bucket}/{name}")
    }
}
