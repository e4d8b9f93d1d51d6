//! Narrow request shapes the storage workflows accept.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bucket::bucket_name;
use crate::codec::CommitSha;
use crate::error::StoreError;

/// Source-control project coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: u64,
    pub name: String,
}

impl ProjectRef {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn bucket_name(&self) -> String {
        bucket_name(self.id, &self.name)
    }
}

/// A release tag, trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReleaseTag(String);

impl ReleaseTag {
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(StoreError::InvalidRequest(
                "release tag cannot be empty".to_string(),
            ));
        }
        Ok(ReleaseTag(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ReleaseTag {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ReleaseTag::parse(&value)
    }
}

impl From<ReleaseTag> for String {
    fn from(tag: ReleaseTag) -> Self {
        tag.0
    }
}

/// Store one merge request's documentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MrDocumentationRequest {
    pub project: ProjectRef,
    pub commit_sha: CommitSha,
    pub source_branch: String,
}

/// Gather or publish documentation for a release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseNoteRequest {
    pub project: ProjectRef,
    pub release_tag: ReleaseTag,
}
