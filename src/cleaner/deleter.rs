// Batch deletion: re-authorizes every path, then quarantines or removes it.
// Per-path failures are collected; one bad path never stops the batch.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::error::{Result, SurgeError};
use crate::fs::DirectoryTreeWalker;
use crate::quarantine::{QuarantineRecord, QuarantineStore};
use crate::security::PathAuthorizer;

/// Outcome of a delete request. A non-empty `errors` list means partial
/// success, not failure of the call. Every input path is accounted for:
/// `deleted_count + errors.len()` equals the batch length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionReport {
    pub deleted_count: usize,
    pub freed_space_bytes: u64,
    pub errors: Vec<String>,
    #[serde(default)]
    pub quarantined: Vec<QuarantineRecord>,
}

#[derive(Debug, Clone)]
pub struct DeletionExecutor {
    authorizer: Arc<PathAuthorizer>,
    walker: DirectoryTreeWalker,
    store: QuarantineStore,
}

impl DeletionExecutor {
    pub fn new(authorizer: Arc<PathAuthorizer>, walker: DirectoryTreeWalker, store: QuarantineStore) -> Self {
        Self {
            authorizer,
            walker,
            store,
        }
    }

    pub fn store(&self) -> &QuarantineStore {
        &self.store
    }

    /// Delete a batch of paths.
    ///
    /// # Arguments
    /// * `paths` - Caller-supplied paths, typically items of an earlier scan
    /// * `use_quarantine` - Move into the quarantine root instead of removing
    /// * `cancel` - Checked between paths; unprocessed paths are reported as errors
    pub fn delete<P: AsRef<Path>>(
        &self,
        paths: &[P],
        use_quarantine: bool,
        cancel: &CancelToken,
    ) -> Result<DeletionReport> {
        if paths.is_empty() {
            return Err(SurgeError::invalid_request("no paths to delete"));
        }

        let mut report = DeletionReport::default();
        let mut seen: HashSet<PathBuf> = HashSet::new();

        for (index, raw) in paths.iter().enumerate() {
            if cancel.is_cancelled() {
                for rest in &paths[index..] {
                    report
                        .errors
                        .push(format!("{}: {}", rest.as_ref().display(), SurgeError::Cancelled));
                }
                warn!(remaining = paths.len() - index, "deletion cancelled");
                break;
            }

            let canonical = match self.authorizer.authorize_for_deletion(raw.as_ref()) {
                Ok(canonical) => canonical,
                Err(e) => {
                    warn!(path = %raw.as_ref().display(), reason = %e, "deletion refused");
                    report.errors.push(describe_error(raw.as_ref(), &e));
                    continue;
                }
            };

            if !seen.insert(canonical.clone()) {
                debug!(path = %canonical.display(), "duplicate path in batch");
                report
                    .errors
                    .push(format!("{}: listed more than once in the batch", canonical.display()));
                continue;
            }

            match self.delete_one(&canonical, use_quarantine, cancel) {
                Ok((size, record)) => {
                    report.deleted_count += 1;
                    report.freed_space_bytes += size;
                    report.quarantined.extend(record);
                }
                Err(e) => {
                    warn!(path = %canonical.display(), error = %e, "deletion failed");
                    report.errors.push(describe_error(&canonical, &e));
                }
            }
        }

        info!(
            deleted = report.deleted_count,
            freed = report.freed_space_bytes,
            errors = report.errors.len(),
            quarantine = use_quarantine,
            "deletion complete"
        );
        Ok(report)
    }

    fn delete_one(
        &self,
        path: &Path,
        use_quarantine: bool,
        cancel: &CancelToken,
    ) -> Result<(u64, Option<QuarantineRecord>)> {
        let metadata = fs::symlink_metadata(path)
            .map_err(|e| SurgeError::from_io_error(e, "reading metadata", Some(path.to_path_buf())))?;

        // Everything the removal takes, including hidden entries the walk filter skips
        let size = self.walker.footprint(path, cancel)?.bytes;

        if use_quarantine {
            let record = self.store.quarantine(path, size)?;
            return Ok((size, Some(record)));
        }

        let removed = if metadata.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        removed.map_err(|e| SurgeError::from_io_error(e, "deleting", Some(path.to_path_buf())))?;
        Ok((size, None))
    }
}

/// Error text for the report. Errors that already name their path are used
/// as-is; the rest are prefixed with the path.
fn describe_error(path: &Path, err: &SurgeError) -> String {
    match err {
        SurgeError::EmptyPath | SurgeError::Cancelled | SurgeError::Io(_) => {
            format!("{}: {}", path.display(), err)
        }
        _ => err.to_string(),
    }
}
