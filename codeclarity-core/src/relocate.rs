//! Atomic relocation of per-commit docs into a release folder.
//!
//! Each candidate is moved with one server-side rename. A rename that finds its source gone
//! is resolved by checking the destination: if it is there, another mover got to it first and
//! the item counts as moved. Any other backend error aborts the batch.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::{info, warn};

use crate::contract::{basename, BackendError};
use crate::error::{Result, StoreError};
use crate::store::{folder_prefix, DocumentStore};

/// Reason recorded when neither source nor destination exists.
pub const SOURCE_NOT_FOUND: &str = "source not found";

/// Outcome of one relocation batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelocationResult {
    /// Source name to destination name, for every object now at its destination.
    pub moved: BTreeMap<String, String>,
    /// Source name to reason, for candidates that could not be moved.
    pub failed: BTreeMap<String, String>,
}

pub struct Relocator<'a> {
    documents: &'a DocumentStore,
}

impl<'a> Relocator<'a> {
    pub fn new(documents: &'a DocumentStore) -> Self {
        Self { documents }
    }

    /// Move every candidate whose name mentions one of `shas_to_move` into `destination_folder`.
    ///
    /// The sha match is a substring pre-filter on the name, not a decoded-identity match.
    pub async fn relocate<S: AsRef<str>>(
        &self,
        candidate_names: &[String],
        destination_folder: &str,
        shas_to_move: &[S],
    ) -> Result<RelocationResult> {
        let bucket = self.documents.bucket().name();
        let backend = self.documents.backend();
        let destination_folder = folder_prefix(destination_folder);
        let shas: HashSet<&str> = shas_to_move.iter().map(AsRef::as_ref).collect();

        let mut result = RelocationResult::default();
        for source in candidate_names {
            if !shas.iter().any(|sha| source.contains(sha)) {
                continue;
            }
            let destination = format!("{destination_folder}{}", basename(source));

            match backend.rename_object(bucket, source, &destination).await {
                Ok(new_name) => {
                    info!(bucket, source = %source, destination = %new_name, "[RELOCATE] Moved");
                    result.moved.insert(source.clone(), new_name);
                }
                Err(BackendError::NotFound) => {
                    let already_moved = backend
                        .object_exists(bucket, &destination)
                        .await
                        .map_err(|e| relocation_error(source, &destination, e))?;
                    if already_moved {
                        info!(bucket, source = %source, destination = %destination, "[RELOCATE] Already moved by another process");
                        result.moved.insert(source.clone(), destination);
                    } else {
                        warn!(bucket, source = %source, "[RELOCATE] Source not found");
                        result
                            .failed
                            .insert(source.clone(), SOURCE_NOT_FOUND.to_string());
                    }
                }
                Err(e) => return Err(relocation_error(source, &destination, e)),
            }
        }

        info!(
            bucket,
            destination = %destination_folder,
            moved = result.moved.len(),
            failed = result.failed.len(),
            "[RELOCATE] Batch move summary"
        );
        Ok(result)
    }
}

fn relocation_error(source: &str, destination: &str, err: BackendError) -> StoreError {
    StoreError::Relocation {
        source_name: source.to_string(),
        destination: destination.to_string(),
        message: err.to_string(),
    }
}
