// Duplicate file detection
// Phase one buckets files by exact size, phase two hashes only buckets with
// two or more members and groups them by content digest

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::digest::{hash_file, ContentHash};
use crate::cancel::CancelToken;
use crate::error::{Result, SurgeError};
use crate::fs::{DirectoryTreeWalker, FileRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateFile {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
    pub modification_date: DateTime<Local>,
}

/// Files with identical size and content. Always holds at least two members,
/// oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    pub content_hash: ContentHash,
    pub members: Vec<DuplicateFile>,
    pub total_size: u64,
    /// Bytes recovered by keeping one copy.
    pub wasted_space: u64,
}

/// Which member of a group survives when the rest are selected for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeepPolicy {
    #[default]
    Oldest,
    Newest,
}

impl DuplicateGroup {
    /// Build a group, or `None` when fewer than two members remain.
    pub fn from_members(content_hash: ContentHash, mut members: Vec<DuplicateFile>) -> Option<Self> {
        if members.len() < 2 {
            return None;
        }
        members.sort_by(|a, b| {
            a.modification_date
                .cmp(&b.modification_date)
                .then_with(|| a.path.cmp(&b.path))
        });
        let total_size: u64 = members.iter().map(|m| m.size_bytes).sum();
        let wasted_space = total_size - members[0].size_bytes;
        Some(Self {
            content_hash,
            members,
            total_size,
            wasted_space,
        })
    }

    /// Every member except the one kept by `policy`.
    pub fn redundant_members(&self, policy: KeepPolicy) -> Vec<&DuplicateFile> {
        match policy {
            KeepPolicy::Oldest => self.members.iter().skip(1).collect(),
            KeepPolicy::Newest => {
                let keep = self.members.len().saturating_sub(1);
                self.members.iter().take(keep).collect()
            }
        }
    }
}

/// Space recoverable across all groups.
pub fn total_wasted_space(groups: &[DuplicateGroup]) -> u64 {
    groups.iter().map(|g| g.wasted_space).sum()
}

#[derive(Debug, Clone)]
pub struct DuplicateDetector {
    walker: DirectoryTreeWalker,
    threads: Option<usize>,
}

impl DuplicateDetector {
    pub fn new(walker: DirectoryTreeWalker) -> Self {
        Self {
            walker,
            threads: None,
        }
    }

    /// Hash on a dedicated pool of `threads` workers instead of the global one.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads.max(1));
        self
    }

    /// Find duplicate files of at least `min_size` bytes under `roots`.
    ///
    /// Groups are ordered by wasted space, largest first. Files that cannot
    /// be hashed are logged and left out.
    pub fn find_duplicates<P: AsRef<Path>>(
        &self,
        roots: &[P],
        min_size: u64,
        cancel: &CancelToken,
    ) -> Result<Vec<DuplicateGroup>> {
        if roots.is_empty() {
            return Err(SurgeError::invalid_request("no roots to search"));
        }
        // Empty files are all identical and free nothing.
        let min_size = min_size.max(1);

        let buckets = self.size_buckets(roots, min_size, cancel)?;
        let candidates: usize = buckets.iter().map(Vec::len).sum();
        debug!(buckets = buckets.len(), candidates, "hashing size buckets");

        let hashed: Result<Vec<Vec<DuplicateGroup>>> = match self.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| SurgeError::OperationFailed {
                        detail: format!("cannot start hashing pool: {}", e),
                    })?;
                pool.install(|| hash_buckets(buckets, cancel))
            }
            None => hash_buckets(buckets, cancel),
        };

        let mut groups: Vec<DuplicateGroup> = hashed?.into_iter().flatten().collect();
        groups.sort_by(|a, b| {
            b.wasted_space
                .cmp(&a.wasted_space)
                .then_with(|| a.content_hash.cmp(&b.content_hash))
        });

        info!(
            groups = groups.len(),
            wasted = total_wasted_space(&groups),
            "duplicate search complete"
        );
        Ok(groups)
    }

    /// Size buckets holding two or more distinct files.
    fn size_buckets<P: AsRef<Path>>(
        &self,
        roots: &[P],
        min_size: u64,
        cancel: &CancelToken,
    ) -> Result<Vec<Vec<FileRecord>>> {
        let mut by_size: HashMap<u64, Vec<FileRecord>> = HashMap::new();
        let mut seen_paths: HashSet<PathBuf> = HashSet::new();
        let mut seen_inodes: HashSet<(u64, u64)> = HashSet::new();

        for root in roots {
            let root = self.walker.authorizer().authorize_for_reading(root.as_ref())?;
            for file in self.walker.collect_files(&root, cancel)? {
                if file.size < min_size {
                    continue;
                }
                // Overlapping roots yield the same path twice
                if !seen_paths.insert(file.path.clone()) {
                    continue;
                }
                // Removing a hard link frees nothing
                if let Some(identity) = file.identity {
                    if !seen_inodes.insert(identity) {
                        continue;
                    }
                }
                by_size.entry(file.size).or_default().push(file);
            }
        }

        Ok(by_size.into_values().filter(|files| files.len() >= 2).collect())
    }
}

fn hash_buckets(buckets: Vec<Vec<FileRecord>>, cancel: &CancelToken) -> Result<Vec<Vec<DuplicateGroup>>> {
    buckets
        .into_par_iter()
        .map(|bucket| hash_bucket(bucket, cancel))
        .collect()
}

fn hash_bucket(bucket: Vec<FileRecord>, cancel: &CancelToken) -> Result<Vec<DuplicateGroup>> {
    let mut by_hash: BTreeMap<ContentHash, Vec<DuplicateFile>> = BTreeMap::new();

    for file in bucket {
        match hash_file(&file.path, cancel) {
            Ok(hash) => by_hash.entry(hash).or_default().push(DuplicateFile {
                name: file.name(),
                size_bytes: file.size,
                modification_date: DateTime::<Local>::from(file.modified.unwrap_or(SystemTime::UNIX_EPOCH)),
                path: file.path,
            }),
            Err(SurgeError::Cancelled) => return Err(SurgeError::Cancelled),
            Err(e) => warn!(path = %file.path.display(), error = %e, "cannot hash file"),
        }
    }

    Ok(by_hash
        .into_iter()
        .filter_map(|(hash, members)| DuplicateGroup::from_members(hash, members))
        .collect())
}
