//! Deduplication guard for per-commit documentation.
//!
//! The check is read-then-write: two concurrent requests for the same commit can both see
//! "not present" and both upload, leaving two objects that differ only in timestamp. That
//! at-least-once outcome is accepted; no lock or conditional create is taken here.

use tracing::{info, warn};

use crate::codec::CommitSha;
use crate::error::{Result, StoreError};
use crate::store::{DocumentStore, CURRENT_RELEASE};

pub struct DeduplicationGuard<'a> {
    documents: &'a DocumentStore,
}

impl<'a> DeduplicationGuard<'a> {
    pub fn new(documents: &'a DocumentStore) -> Self {
        Self { documents }
    }

    /// Whether the current release already holds documentation for `sha`.
    pub async fn is_duplicate(&self, sha: &CommitSha) -> Result<bool> {
        let shas = self.documents.list_shas(CURRENT_RELEASE).await?;
        Ok(shas.contains(sha))
    }

    /// Fail with [`StoreError::DuplicateDocumentation`] if `sha` is already documented.
    pub async fn ensure_unique(&self, sha: &CommitSha) -> Result<()> {
        if self.is_duplicate(sha).await? {
            warn!(
                bucket = self.documents.bucket().name(),
                sha = %sha,
                "Documentation already exists for commit"
            );
            return Err(StoreError::DuplicateDocumentation(sha.to_string()));
        }
        info!(bucket = self.documents.bucket().name(), sha = %sha, "No existing documentation for commit");
        Ok(())
    }
}
