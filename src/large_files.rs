//! Large and old file detection.
//!
//! A file is reported when it is at least `min_size` bytes AND was last
//! modified at least `min_age_days` ago. Ages are snapshots taken at
//! evaluation time.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cancel::CancelToken;
use crate::error::{Result, SurgeError};
use crate::fs::DirectoryTreeWalker;

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LargeFileRecord {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
    pub modification_date: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_access_date: Option<DateTime<Local>>,
    /// Whole calendar days between the modification date and now, local time.
    pub age_days: i64,
}

/// Records split by size band.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeClasses {
    /// 1 GiB and above
    pub huge: Vec<LargeFileRecord>,
    /// 500 MiB up to 1 GiB
    pub very_large: Vec<LargeFileRecord>,
    /// 100 MiB up to 500 MiB
    pub large: Vec<LargeFileRecord>,
    /// Below 100 MiB
    pub medium: Vec<LargeFileRecord>,
}

impl SizeClasses {
    pub fn classify(records: &[LargeFileRecord]) -> Self {
        let mut classes = Self::default();
        for record in records {
            let band = match record.size_bytes {
                s if s >= GIB => &mut classes.huge,
                s if s >= 500 * MIB => &mut classes.very_large,
                s if s >= 100 * MIB => &mut classes.large,
                _ => &mut classes.medium,
            };
            band.push(record.clone());
        }
        classes
    }

    pub fn total_count(&self) -> usize {
        self.huge.len() + self.very_large.len() + self.large.len() + self.medium.len()
    }

    pub fn total_size(&self) -> u64 {
        total_size(&self.huge) + total_size(&self.very_large) + total_size(&self.large) + total_size(&self.medium)
    }
}

pub fn total_size(records: &[LargeFileRecord]) -> u64 {
    records.iter().map(|r| r.size_bytes).sum()
}

#[derive(Debug, Clone)]
pub struct LargeOldFileDetector {
    walker: DirectoryTreeWalker,
}

impl LargeOldFileDetector {
    pub fn new(walker: DirectoryTreeWalker) -> Self {
        Self { walker }
    }

    /// Files under `roots` that are both large and old, largest first.
    pub fn find<P: AsRef<Path>>(
        &self,
        roots: &[P],
        min_size: u64,
        min_age_days: u64,
        cancel: &CancelToken,
    ) -> Result<Vec<LargeFileRecord>> {
        if roots.is_empty() {
            return Err(SurgeError::invalid_request("no roots to search"));
        }
        if min_age_days == 0 {
            return Err(SurgeError::invalid_request("minimum age must be at least one day"));
        }

        let now = Local::now();
        // Clamped to stay inside chrono's representable range
        let days = i64::try_from(min_age_days).unwrap_or(i64::MAX).min(365 * 10_000);
        let cutoff = now - Duration::days(days);

        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut records = Vec::new();

        for root in roots {
            let root = self.walker.authorizer().authorize_for_reading(root.as_ref())?;
            for file in self.walker.collect_files(&root, cancel)? {
                if file.size < min_size {
                    continue;
                }
                let Some(modified) = file.modified.map(DateTime::<Local>::from) else {
                    continue;
                };
                if modified > cutoff {
                    continue;
                }
                if !seen.insert(file.path.clone()) {
                    continue;
                }

                records.push(LargeFileRecord {
                    name: file.name(),
                    size_bytes: file.size,
                    last_access_date: file.accessed.map(DateTime::<Local>::from),
                    age_days: (now.date_naive() - modified.date_naive()).num_days(),
                    modification_date: modified,
                    path: file.path,
                });
            }
        }

        records.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes).then_with(|| a.path.cmp(&b.path)));

        info!(
            files = records.len(),
            bytes = total_size(&records),
            "large file search complete"
        );
        Ok(records)
    }
}
