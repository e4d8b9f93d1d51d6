//! Release aggregation: gather the per-commit docs belonging to a release into one corpus.
//!
//! Documents appear in the order the backing store lists them. That order is not re-sorted
//! and is not guaranteed stable across calls.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::codec::{self, CommitSha};
use crate::error::{Result, StoreError};
use crate::store::{DocumentStore, CURRENT_RELEASE};

/// Commit identities that make up one release, computed from source-control history.
pub type ReleaseBundle = HashSet<CommitSha>;

/// Heading at the top of every non-empty corpus.
pub const CORPUS_HEADER: &str = "# Merge Request Documentation for Release\n\n";

/// One commit's documentation, as pulled for a release.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseDocument {
    pub sha: CommitSha,
    pub filename: String,
    pub content: String,
    pub token_estimate: usize,
}

/// All documents of a release concatenated for the release-note generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormattedCorpus {
    pub formatted_text: String,
    pub total_documents: usize,
    pub estimated_tokens: usize,
}

/// Rough size estimate: one token per four characters.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// Concatenate documents under a header, one titled section each, separated by rules.
pub fn format_corpus(documents: &[ReleaseDocument]) -> FormattedCorpus {
    if documents.is_empty() {
        return FormattedCorpus::default();
    }

    let mut formatted_text = String::from(CORPUS_HEADER);
    for (i, doc) in documents.iter().enumerate() {
        formatted_text.push_str(&format!(
            "## Document {}: {}\n**SHA:** {}\n**Content:**\n{}\n\n---\n\n",
            i + 1,
            doc.filename,
            doc.sha,
            doc.content
        ));
    }

    FormattedCorpus {
        formatted_text,
        total_documents: documents.len(),
        estimated_tokens: documents.iter().map(|d| d.token_estimate).sum(),
    }
}

pub struct ReleaseAggregator<'a> {
    documents: &'a DocumentStore,
}

impl<'a> ReleaseAggregator<'a> {
    pub fn new(documents: &'a DocumentStore) -> Self {
        Self { documents }
    }

    /// Documents under `current_release` whose commit is in `bundle`.
    ///
    /// Fails with [`StoreError::NoMatchingDocumentation`] when nothing overlaps.
    pub async fn collect(&self, bundle: &ReleaseBundle) -> Result<Vec<ReleaseDocument>> {
        let bucket = self.documents.bucket().name();
        let available = self.documents.list_shas(CURRENT_RELEASE).await?;
        let common: HashSet<&CommitSha> = bundle.intersection(&available).collect();
        info!(
            bucket,
            requested = bundle.len(),
            available = available.len(),
            matched = common.len(),
            "Matched release commits against stored documentation"
        );
        if common.is_empty() {
            return Err(StoreError::NoMatchingDocumentation {
                bucket: bucket.to_string(),
            });
        }

        let mut documents = Vec::new();
        for object in self.documents.list(CURRENT_RELEASE).await? {
            let Some(sha) = codec::decode(&object.name) else {
                continue;
            };
            if !common.contains(&sha) {
                continue;
            }
            let content = self.documents.download_object(&object.name).await?;
            let token_estimate = estimate_tokens(&content);
            debug!(bucket, object = %object.name, token_estimate, "Fetched release document");
            documents.push(ReleaseDocument {
                sha,
                filename: object.basename().to_string(),
                content,
                token_estimate,
            });
        }
        Ok(documents)
    }

    /// Gather and format the release's documentation.
    pub async fn gather_for_release(&self, bundle: &ReleaseBundle) -> Result<FormattedCorpus> {
        let documents = self.collect(bundle).await?;
        let corpus = format_corpus(&documents);
        info!(
            bucket = self.documents.bucket().name(),
            total_documents = corpus.total_documents,
            estimated_tokens = corpus.estimated_tokens,
            "Formatted release corpus"
        );
        Ok(corpus)
    }
}
