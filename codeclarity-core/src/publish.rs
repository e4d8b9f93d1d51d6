//! Storage workflows: publish merge request docs, gather a release, publish a release note.
//!
//! These sequence the components for the two use cases:
//!
//! - Merge request path: ensure bucket → deduplication guard → upload into `current_release/`.
//! - Release path: gather matching docs → (external release-note generation) → upload the
//!   note into `releases/{tag}/` → relocate the matched per-commit docs into
//!   `releases/{tag}/mr_docs/`.
//!
//! # Error Handling
//! Every step fails fast with a typed [`StoreError`], except relocation after a release note
//! upload: the note is already stored, so a relocation failure is logged as a warning and
//! reported as `relocation: None`.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::aggregate::{FormattedCorpus, ReleaseAggregator, ReleaseBundle};
use crate::bucket::BucketResolver;
use crate::codec::{self, format_timestamp, CommitSha};
use crate::contract::SharedStore;
use crate::error::Result;
use crate::guard::DeduplicationGuard;
use crate::relocate::{RelocationResult, Relocator};
use crate::request::{MrDocumentationRequest, ReleaseNoteRequest, ReleaseTag};
use crate::store::{release_docs_folder, release_folder, DocumentStore, CURRENT_RELEASE};

/// Result of publishing a release note.
#[derive(Debug, Clone, Serialize)]
pub struct ReleasePublication {
    /// URI of the stored release note.
    pub uri: String,
    /// Relocation outcome, `None` if relocation failed.
    pub relocation: Option<RelocationResult>,
}

/// Object name for a release note.
pub fn release_note_name(timestamp: &NaiveDateTime, tag: &ReleaseTag) -> String {
    format!("{}_release-note_{}.md", format_timestamp(timestamp), tag)
}

/// Store one merge request's documentation under `current_release/`. Returns its URI.
///
/// Fails with `DuplicateDocumentation` if the commit is already documented.
pub async fn publish_mr_documentation(
    store: &SharedStore,
    request: &MrDocumentationRequest,
    documentation: &str,
    timestamp: &NaiveDateTime,
) -> Result<String> {
    let resolver = BucketResolver::new(store.clone());
    let bucket_name = resolver.resolve(request.project.id, &request.project.name);
    info!(bucket = %bucket_name, sha = %request.commit_sha, branch = %request.source_branch, "[PUBLISH] Storing merge request documentation");

    let bucket = resolver.ensure_exists(&bucket_name).await?;
    let documents = DocumentStore::new(store.clone(), bucket);

    DeduplicationGuard::new(&documents)
        .ensure_unique(&request.commit_sha)
        .await?;

    let name = codec::encode(timestamp, &request.commit_sha, &request.source_branch);
    let uri = documents.upload(CURRENT_RELEASE, &name, documentation).await?;
    info!(uri = %uri, "[PUBLISH] Merge request documentation stored");
    Ok(uri)
}

/// Gather the stored documentation for the commits in `bundle`.
///
/// Fails with `BucketNotFound` if the project has no bucket yet, and with
/// `NoMatchingDocumentation` if none of the commits are documented.
pub async fn gather_release_documentation(
    store: &SharedStore,
    request: &ReleaseNoteRequest,
    bundle: &ReleaseBundle,
) -> Result<FormattedCorpus> {
    let resolver = BucketResolver::new(store.clone());
    let bucket_name = resolver.resolve(request.project.id, &request.project.name);
    info!(bucket = %bucket_name, tag = %request.release_tag, commits = bundle.len(), "[PUBLISH] Gathering release documentation");

    let bucket = resolver.lookup(&bucket_name).await?;
    let documents = DocumentStore::new(store.clone(), bucket);
    ReleaseAggregator::new(&documents)
        .gather_for_release(bundle)
        .await
}

/// Store a release note and move the release's per-commit docs next to it.
pub async fn publish_release_note(
    store: &SharedStore,
    request: &ReleaseNoteRequest,
    release_note: &str,
    shas: &[CommitSha],
    timestamp: &NaiveDateTime,
) -> Result<ReleasePublication> {
    let resolver = BucketResolver::new(store.clone());
    let bucket_name = resolver.resolve(request.project.id, &request.project.name);
    let tag = &request.release_tag;

    let bucket = resolver.ensure_exists(&bucket_name).await?;
    let documents = DocumentStore::new(store.clone(), bucket);

    let name = release_note_name(timestamp, tag);
    let uri = documents
        .upload(&release_folder(tag.as_str()), &name, release_note)
        .await?;
    info!(uri = %uri, tag = %tag, "[PUBLISH] Release note stored");

    let relocation = match relocate_release_docs(&documents, tag, shas).await {
        Ok(result) => Some(result),
        Err(e) => {
            warn!(error = %e, tag = %tag, "[PUBLISH] Non-critical: failed to move merge request documentation");
            None
        }
    };

    Ok(ReleasePublication { uri, relocation })
}

async fn relocate_release_docs(
    documents: &DocumentStore,
    tag: &ReleaseTag,
    shas: &[CommitSha],
) -> Result<RelocationResult> {
    let candidates: Vec<String> = documents
        .list(CURRENT_RELEASE)
        .await?
        .into_iter()
        .map(|o| o.name)
        .collect();
    if candidates.is_empty() {
        info!(tag = %tag, "[PUBLISH] No pending documentation to relocate");
        return Ok(RelocationResult::default());
    }

    let shas: Vec<&str> = shas.iter().map(CommitSha::as_str).collect();
    let result = Relocator::new(documents)
        .relocate(&candidates, &release_docs_folder(tag.as_str()), &shas)
        .await;
    if let Err(e) = &result {
        error!(error = %e, tag = %tag, "[PUBLISH] Relocation aborted");
    }
    result
}
