// Category scanner: walks the fixed category roots and emits classified,
// already-filtered candidate items

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::category::{Category, CategoryLocations};
use super::describe::describe;
use crate::cancel::CancelToken;
use crate::error::{Result, SurgeError};
use crate::fs::DirectoryTreeWalker;

/// Entries modified more recently than this are never reported.
pub const AGE_PROTECTION_DAYS: u64 = 7;

/// Entries smaller than this are never reported.
pub const MIN_ITEM_SIZE: u64 = 1024;

/// One cleanable item found by a category scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateItem {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub category: Category,
    pub description: String,
    pub last_modified: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct CategoryScanner {
    walker: DirectoryTreeWalker,
    locations: CategoryLocations,
}

impl CategoryScanner {
    pub fn new(walker: DirectoryTreeWalker, locations: CategoryLocations) -> Self {
        Self { walker, locations }
    }

    pub fn locations(&self) -> &CategoryLocations {
        &self.locations
    }

    /// Scan the selected categories.
    ///
    /// Every returned item has passed authorization, the age protection and
    /// the size floor, and no two items share bytes. Items are ordered by
    /// size, largest first.
    pub fn scan(&self, categories: &BTreeSet<Category>, cancel: &CancelToken) -> Result<Vec<CandidateItem>> {
        if categories.is_empty() {
            return Err(SurgeError::invalid_request("no categories selected"));
        }

        let cutoff = SystemTime::now() - Duration::from_secs(AGE_PROTECTION_DAYS * 86_400);
        let mut claimed: Vec<PathBuf> = Vec::new();
        let mut items = Vec::new();

        for category in Category::SCAN_ORDER {
            if !categories.contains(&category) {
                continue;
            }

            let before = items.len();
            for root in self.locations.roots(category) {
                cancel.check()?;

                if !category.reports_children() {
                    if let Some(item) = self.consider(category, root, cutoff, &claimed, cancel)? {
                        claimed.push(item.path.clone());
                        items.push(item);
                    }
                    continue;
                }

                let entries = match fs::read_dir(root) {
                    Ok(entries) => entries,
                    Err(e) => {
                        debug!(root = %root.display(), error = %e, "category root not readable");
                        continue;
                    }
                };

                for entry in entries.flatten() {
                    cancel.check()?;
                    if !self.walker.hidden_policy().allows(&entry.file_name()) {
                        continue;
                    }
                    if let Some(item) = self.consider(category, &entry.path(), cutoff, &claimed, cancel)? {
                        claimed.push(item.path.clone());
                        items.push(item);
                    }
                }
            }
            debug!(category = category.name(), found = items.len() - before, "category scanned");
        }

        items.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes).then_with(|| a.path.cmp(&b.path)));

        info!(
            items = items.len(),
            bytes = items.iter().map(|i| i.size_bytes).sum::<u64>(),
            "category scan complete"
        );
        Ok(items)
    }

    /// Apply the per-entry rules. `Ok(None)` means the entry is omitted.
    fn consider(
        &self,
        category: Category,
        path: &Path,
        cutoff: SystemTime,
        claimed: &[PathBuf],
        cancel: &CancelToken,
    ) -> Result<Option<CandidateItem>> {
        let Ok(metadata) = fs::symlink_metadata(path) else {
            return Ok(None);
        };
        if metadata.file_type().is_symlink() {
            return Ok(None);
        }

        // Items are offered for deletion, so they must pass the deletion rules.
        let canonical = match self.walker.authorizer().authorize_for_deletion(path) {
            Ok(canonical) => canonical,
            Err(e) => {
                debug!(path = %path.display(), reason = %e, "entry rejected");
                return Ok(None);
            }
        };

        let Ok(modified) = metadata.modified() else {
            return Ok(None);
        };
        if modified > cutoff {
            debug!(path = %canonical.display(), "entry is age protected");
            return Ok(None);
        }

        if claimed
            .iter()
            .any(|c| canonical.starts_with(c) || c.starts_with(&canonical))
        {
            return Ok(None);
        }

        // A directory's own mtime does not change when a file inside it is rewritten.
        let footprint = match self.walker.footprint(&canonical, cancel) {
            Ok(footprint) => footprint,
            Err(SurgeError::Cancelled) => return Err(SurgeError::Cancelled),
            Err(e) => {
                debug!(path = %canonical.display(), error = %e, "cannot size entry");
                return Ok(None);
            }
        };
        if footprint.modified_after(cutoff) {
            debug!(path = %canonical.display(), "entry holds recently modified files");
            return Ok(None);
        }
        if footprint.unreadable > 0 {
            debug!(
                path = %canonical.display(),
                unreadable = footprint.unreadable,
                "entry has unreadable contents"
            );
            return Ok(None);
        }
        let size = footprint.bytes;

        if size < MIN_ITEM_SIZE {
            return Ok(None);
        }

        Ok(Some(CandidateItem {
            description: describe(category, &canonical, metadata.is_dir()),
            path: canonical,
            size_bytes: size,
            category,
            last_modified: DateTime::<Local>::from(footprint.newest_modified.unwrap_or(modified)),
        }))
    }
}
