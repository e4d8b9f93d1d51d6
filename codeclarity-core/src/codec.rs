//! Filename codec for per-commit documentation objects.
//!
//! Object names have the shape `{YYYYMMDD_HHMMSS}_{sha}_{branch}.md`. Only the commit identity
//! is recoverable from a name: a branch containing underscores or a 40-hex run can make the
//! timestamp/branch split ambiguous, and `decode` returns the *first* 40-hex segment it sees.
//!
//! Slashes in the branch are replaced with `-` so a name is always a single path segment
//! below its folder.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::contract::basename;
use crate::error::StoreError;

/// `strftime` pattern for the timestamp prefix.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Suffix every documentation object carries.
pub const MARKDOWN_SUFFIX: &str = ".md";

/// Length of a full commit hash.
pub const SHA_LEN: usize = 40;

fn is_commit_sha(raw: &str) -> bool {
    raw.len() == SHA_LEN && raw.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// A 40-character lowercase hexadecimal commit hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommitSha(String);

impl CommitSha {
    /// Validate and wrap a commit hash.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        if is_commit_sha(raw) {
            Ok(CommitSha(raw.to_string()))
        } else {
            Err(StoreError::InvalidRequest(format!(
                "commit sha must be 40 lowercase hex characters, got '{raw}'"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitSha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CommitSha {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CommitSha::parse(&value)
    }
}

impl From<CommitSha> for String {
    fn from(sha: CommitSha) -> Self {
        sha.0
    }
}

impl std::str::FromStr for CommitSha {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommitSha::parse(s)
    }
}

/// Format a timestamp as used in object names.
pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Branch as it appears in object names: `/` becomes `-`.
pub fn branch_segment(branch: &str) -> String {
    branch.replace('/', "-")
}

/// Compose the object name for one commit's documentation.
///
/// If the branch would still shadow the commit identity on decode (a 40-hex run of its own),
/// a warning is logged and the name is returned as is.
pub fn encode(timestamp: &NaiveDateTime, sha: &CommitSha, branch: &str) -> String {
    let name = format!(
        "{}_{}_{}{}",
        format_timestamp(timestamp),
        sha,
        branch_segment(branch),
        MARKDOWN_SUFFIX
    );
    if decode(&name).as_ref() != Some(sha) {
        tracing::warn!(
            object = %name,
            sha = %sha,
            branch,
            "Encoded name does not decode to its commit sha; branch contains a competing 40-hex segment"
        );
    }
    name
}

/// Recover the commit identity from an object name, ignoring any folder prefix.
///
/// Returns `None` for names without the `.md` suffix or without a 40-hex segment.
pub fn decode(name: &str) -> Option<CommitSha> {
    let stem = basename(name).strip_suffix(MARKDOWN_SUFFIX)?;
    stem.split('_')
        .find(|part| is_commit_sha(part))
        .map(|part| CommitSha(part.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SHA: &str = "5cf4623466a85a9308fa47c3f141714235177f3d";

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 7, 13)
            .unwrap()
            .and_hms_opt(7, 31, 24)
            .unwrap()
    }

    #[test]
    fn encode_uses_timestamp_sha_branch_layout() {
        let sha = CommitSha::parse(SHA).unwrap();
        assert_eq!(
            encode(&ts(), &sha, "feature-x"),
            format!("20250713_073124_{SHA}_feature-x.md")
        );
    }

    #[test]
    fn decode_inverts_encode_for_plain_branches() {
        let sha = CommitSha::parse(SHA).unwrap();
        for branch in ["main", "feature-x", "fix/login", "release-1.2", ""] {
            let name = encode(&ts(), &sha, branch);
            assert_eq!(decode(&name), Some(sha.clone()), "branch {branch:?}");
            assert_eq!(decode(&format!("current_release/{name}")), Some(sha.clone()));
        }
    }

    #[test]
    fn slashes_in_branch_stay_inside_one_segment() {
        let sha = CommitSha::parse(SHA).unwrap();
        let name = encode(&ts(), &sha, "feature/auth/login");
        assert_eq!(name, format!("20250713_073124_{SHA}_feature-auth-login.md"));
        assert!(!name.contains('/'));
        assert_eq!(decode(&format!("releases/v1/mr_docs/{name}")), Some(sha));
    }

    #[test]
    fn decode_never_panics_on_malformed_names() {
        assert_eq!(decode(""), None);
        assert_eq!(decode(".md"), None);
        assert_eq!(decode("current_release/"), None);
        assert_eq!(decode("20250713_073124_notasha_main.md"), None);
        assert_eq!(decode(&format!("20250713_073124_{SHA}_main")), None);
        assert_eq!(decode(&format!("20250713_073124_{}_main.md", SHA.to_uppercase())), None);
        assert_eq!(decode("__________.md"), None);
    }

    #[test]
    fn decode_returns_first_hex_segment_when_branch_competes() {
        let other = "0101010101010101010101010101010101010101";
        let name = format!("20250713_073124_{other}_{SHA}.md");
        assert_eq!(decode(&name).unwrap().as_str(), other);
    }

    #[test]
    fn commit_sha_rejects_wrong_length_and_case() {
        assert!(CommitSha::parse(SHA).is_ok());
        assert!(CommitSha::parse(&SHA[..39]).is_err());
        assert!(CommitSha::parse(&SHA.to_uppercase()).is_err());
        assert!(CommitSha::parse(&format!("{SHA}0")).is_err());
    }

    #[test]
    fn commit_sha_deserializes_with_validation() {
        let ok: CommitSha = serde_json::from_str(&format!("\"{SHA}\"")).unwrap();
        assert_eq!(ok.as_str(), SHA);
        assert!(serde_json::from_str::<CommitSha>("\"abc\"").is_err());
    }
}
