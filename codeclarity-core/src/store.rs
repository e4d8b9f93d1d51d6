//! Document store: CRUD and listing of documentation objects in one project bucket.
//!
//! Objects are grouped by folder prefix:
//!
//! ```text
//! current_release/{timestamp}_{sha}_{branch}.md     per-commit doc, pending release
//! releases/{tag}/{timestamp}_release-note_{tag}.md  finalized release note
//! releases/{tag}/mr_docs/{original filename}        relocated per-commit docs
//! ```

use std::collections::HashSet;

use tracing::{debug, info};

use crate::bucket::Bucket;
use crate::codec::{self, CommitSha};
use crate::contract::{ObjectInfo, SharedStore};
use crate::error::{Result, StoreError};

/// Folder holding per-commit docs not yet part of a release.
pub const CURRENT_RELEASE: &str = "current_release";

/// Content type for every stored document.
pub const MARKDOWN_CONTENT_TYPE: &str = "text/markdown";

/// Folder for a finalized release.
pub fn release_folder(tag: &str) -> String {
    format!("releases/{tag}")
}

/// Folder that receives a release's relocated per-commit docs.
pub fn release_docs_folder(tag: &str) -> String {
    format!("releases/{tag}/mr_docs")
}

/// Normalize a folder to a listing prefix ending in `/`. The empty folder is the bucket root.
pub fn folder_prefix(folder: &str) -> String {
    if folder.is_empty() || folder.ends_with('/') {
        folder.to_string()
    } else {
        format!("{folder}/")
    }
}

/// Full object name for `name` inside `folder`.
pub fn object_path(folder: &str, name: &str) -> String {
    format!("{}{}", folder_prefix(folder), name)
}

/// Documentation objects of one bucket.
#[derive(Clone)]
pub struct DocumentStore {
    store: SharedStore,
    bucket: Bucket,
}

impl DocumentStore {
    pub fn new(store: SharedStore, bucket: Bucket) -> Self {
        Self { store, bucket }
    }

    pub fn bucket(&self) -> &Bucket {
        &self.bucket
    }

    pub(crate) fn backend(&self) -> &SharedStore {
        &self.store
    }

    /// All objects under `folder`, in backing-store order. Folder placeholder entries
    /// (names ending in `/`) are dropped.
    pub async fn list(&self, folder: &str) -> Result<Vec<ObjectInfo>> {
        let bucket = self.bucket.name();
        let prefix = folder_prefix(folder);
        let objects = self
            .store
            .list_objects(bucket, &prefix)
            .await
            .map_err(|e| StoreError::from_backend(bucket, e))?;
        let objects: Vec<ObjectInfo> = objects
            .into_iter()
            .filter(|o| !o.name.ends_with('/'))
            .collect();
        debug!(bucket, folder = %prefix, count = objects.len(), "Listed objects");
        Ok(objects)
    }

    /// Commit identities with documentation under `folder`. Several objects for the same
    /// commit collapse to one entry.
    pub async fn list_shas(&self, folder: &str) -> Result<HashSet<CommitSha>> {
        let objects = self.list(folder).await?;
        let shas: HashSet<CommitSha> = objects
            .iter()
            .filter_map(|o| codec::decode(&o.name))
            .collect();
        debug!(
            bucket = self.bucket.name(),
            folder,
            objects = objects.len(),
            shas = shas.len(),
            "Decoded commit shas from object names"
        );
        Ok(shas)
    }

    /// Upload a markdown document, replacing any object of the same name. Returns its URI.
    pub async fn upload(&self, folder: &str, name: &str, content: &str) -> Result<String> {
        self.upload_as(folder, name, content, MARKDOWN_CONTENT_TYPE)
            .await
    }

    /// Upload with an explicit content type.
    pub async fn upload_as(
        &self,
        folder: &str,
        name: &str,
        content: &str,
        content_type: &str,
    ) -> Result<String> {
        let bucket = self.bucket.name();
        let path = object_path(folder, name);
        self.store
            .put_object(bucket, &path, content.as_bytes().to_vec(), content_type)
            .await
            .map_err(|e| StoreError::from_backend(bucket, e))?;
        let uri = self.store.object_uri(bucket, &path);
        info!(bucket, object = %path, uri = %uri, "Uploaded document");
        Ok(uri)
    }

    /// Download `folder/name` as text.
    pub async fn download(&self, folder: &str, name: &str) -> Result<String> {
        self.download_object(&object_path(folder, name)).await
    }

    /// Download an object by its full name.
    pub async fn download_object(&self, path: &str) -> Result<String> {
        let bucket = self.bucket.name();
        let bytes = self
            .store
            .get_object(bucket, path)
            .await
            .map_err(|e| StoreError::from_object_backend(bucket, path, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Whether an object with this full name exists.
    pub async fn exists(&self, path: &str) -> Result<bool> {
        let bucket = self.bucket.name();
        self.store
            .object_exists(bucket, path)
            .await
            .map_err(|e| StoreError::from_backend(bucket, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_prefix_appends_single_separator() {
        assert_eq!(folder_prefix("current_release"), "current_release/");
        assert_eq!(folder_prefix("releases/v1.0/mr_docs/"), "releases/v1.0/mr_docs/");
        assert_eq!(folder_prefix(""), "");
    }

    #[test]
    fn release_folders_follow_layout() {
        assert_eq!(release_folder("v1.0"), "releases/v1.0");
        assert_eq!(release_docs_folder("v1.0"), "releases/v1.0/mr_docs");
        assert_eq!(object_path(&release_docs_folder("v1.0"), "a.md"), "releases/v1.0/mr_docs/a.md");
    }
}
