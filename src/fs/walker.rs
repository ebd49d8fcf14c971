//! Size-aggregating directory traversal shared by every scanner.
//!
//! Two modes: a depth-limited hierarchical walk producing a [`DirectoryNode`]
//! tree, and a flat walk producing one byte total. Both apply the same entry
//! filter (hidden policy, blacklist pruning, no symlinks), so a collapsed
//! directory's flat total always equals what an expanded walk would sum to.
//! [`DirectoryTreeWalker::footprint`] is the exception: it sizes a removal
//! target and sees everything.
//!
//! Entries that cannot be read are skipped; only the root itself must be
//! readable.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use jwalk::{Parallelism, WalkDir};
use tracing::debug;

use super::hidden::HiddenPolicy;
use super::types::{DirectoryNode, FileRecord};
use crate::cancel::CancelToken;
use crate::error::{Result, SurgeError};
use crate::security::PathAuthorizer;

/// Traversal mode for [`DirectoryTreeWalker::walk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    /// Expand directories at depth `d < max_depth` (root is depth 0).
    Hierarchical { max_depth: usize },
    /// Sum every regular file below the root.
    FlatTotal,
}

#[derive(Debug, Clone)]
pub enum WalkOutput {
    Tree(DirectoryNode),
    Total(u64),
}

/// Everything a removal of one entry takes with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Footprint {
    /// Bytes of every regular file, hidden or not.
    pub bytes: u64,
    /// Newest modification time of the entry or anything below it.
    pub newest_modified: Option<SystemTime>,
    /// Directories whose contents could not be listed, plus entries whose
    /// metadata could not be read.
    pub unreadable: usize,
}

impl Footprint {
    fn record(&mut self, metadata: &fs::Metadata) {
        if metadata.is_file() {
            self.bytes += metadata.len();
        }
        if let Ok(modified) = metadata.modified() {
            self.newest_modified = Some(match self.newest_modified {
                Some(newest) => newest.max(modified),
                None => modified,
            });
        }
    }

    /// True when the entry or anything below it changed after `cutoff`.
    pub fn modified_after(&self, cutoff: SystemTime) -> bool {
        self.newest_modified.is_some_and(|newest| newest > cutoff)
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryTreeWalker {
    authorizer: Arc<PathAuthorizer>,
    hidden: Arc<HiddenPolicy>,
}

impl DirectoryTreeWalker {
    pub fn new(authorizer: Arc<PathAuthorizer>, hidden: Arc<HiddenPolicy>) -> Self {
        Self { authorizer, hidden }
    }

    pub fn authorizer(&self) -> &PathAuthorizer {
        &self.authorizer
    }

    pub fn hidden_policy(&self) -> &HiddenPolicy {
        &self.hidden
    }

    /// Walk an already-authorized root in the given mode.
    pub fn walk(&self, root: &Path, mode: WalkMode, cancel: &CancelToken) -> Result<WalkOutput> {
        match mode {
            WalkMode::Hierarchical { max_depth } => {
                self.tree(root, max_depth, cancel).map(WalkOutput::Tree)
            }
            WalkMode::FlatTotal => self.flat_size(root, cancel).map(WalkOutput::Total),
        }
    }

    /// True when a child entry may be visited: not a disallowed dotted name
    /// and not under a blacklisted prefix.
    pub fn admits(&self, path: &Path, name: &OsStr) -> bool {
        admits(&self.authorizer, &self.hidden, path, name)
    }

    /// Build a size tree rooted at `root`.
    pub fn tree(&self, root: &Path, max_depth: usize, cancel: &CancelToken) -> Result<DirectoryNode> {
        let metadata = fs::symlink_metadata(root)
            .map_err(|e| SurgeError::from_io_error(e, "reading metadata", Some(root.to_path_buf())))?;

        if metadata.is_file() {
            return Ok(DirectoryNode::file(root.to_path_buf(), metadata.len()));
        }
        if !metadata.is_dir() {
            return Err(SurgeError::OperationFailed {
                detail: format!("{} is neither a file nor a directory", root.display()),
            });
        }

        // A root that cannot be listed fails the walk; failures below it are skipped.
        self.build_dir(root.to_path_buf(), 0, max_depth, cancel)
    }

    fn build_dir(
        &self,
        path: PathBuf,
        depth: usize,
        max_depth: usize,
        cancel: &CancelToken,
    ) -> Result<DirectoryNode> {
        cancel.check()?;

        if depth >= max_depth {
            let size = self.flat_size(&path, cancel)?;
            return Ok(DirectoryNode::collapsed_dir(path, size));
        }

        let entries = fs::read_dir(&path)
            .map_err(|e| SurgeError::from_io_error(e, "listing directory", Some(path.clone())))?;

        let mut children = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(dir = %path.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };

            let child_path = entry.path();
            if !self.admits(&child_path, &entry.file_name()) {
                continue;
            }

            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(e) => {
                    debug!(path = %child_path.display(), error = %e, "skipping entry");
                    continue;
                }
            };

            if file_type.is_file() {
                match entry.metadata() {
                    Ok(metadata) => children.push(DirectoryNode::file(child_path, metadata.len())),
                    Err(e) => debug!(path = %child_path.display(), error = %e, "skipping entry"),
                }
            } else if file_type.is_dir() {
                match self.build_dir(child_path.clone(), depth + 1, max_depth, cancel) {
                    Ok(node) => children.push(node),
                    Err(SurgeError::Cancelled) => return Err(SurgeError::Cancelled),
                    Err(e) => debug!(path = %child_path.display(), error = %e, "skipping directory"),
                }
            }
        }

        Ok(DirectoryNode::expanded_dir(path, children))
    }

    /// Total size of every regular file at or below `root`.
    pub fn flat_size(&self, root: &Path, cancel: &CancelToken) -> Result<u64> {
        let mut total = 0u64;
        self.for_each_file(root, Parallelism::Serial, cancel, |_, metadata| {
            total += metadata.len();
        })?;
        Ok(total)
    }

    /// Unfiltered summary of `root` and everything below it.
    ///
    /// No hidden-name or blacklist filter applies: this is what `remove_dir_all`
    /// or a quarantine move would take. Symlinks are recorded as links.
    pub fn footprint(&self, root: &Path, cancel: &CancelToken) -> Result<Footprint> {
        let metadata = fs::symlink_metadata(root)
            .map_err(|e| SurgeError::from_io_error(e, "reading metadata", Some(root.to_path_buf())))?;

        let mut footprint = Footprint::default();
        if !metadata.is_dir() {
            footprint.record(&metadata);
            return Ok(footprint);
        }

        let pruning_cancel = cancel.clone();
        let walker = WalkDir::new(root)
            .parallelism(Parallelism::Serial)
            .skip_hidden(false)
            .follow_links(false)
            .process_read_dir(move |_depth, _dir, _state, children| {
                if pruning_cancel.is_cancelled() {
                    children.clear();
                }
            });

        for entry_result in walker {
            cancel.check()?;

            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(root = %root.display(), error = %e, "unreadable entry");
                    footprint.unreadable += 1;
                    continue;
                }
            };
            if let Some(e) = &entry.read_children_error {
                debug!(path = %entry.path().display(), error = %e, "cannot list directory");
                footprint.unreadable += 1;
            }

            match entry.metadata() {
                Ok(metadata) => footprint.record(&metadata),
                Err(e) => {
                    debug!(path = %entry.path().display(), error = %e, "unreadable entry");
                    footprint.unreadable += 1;
                }
            }
        }

        cancel.check()?;
        Ok(footprint)
    }

    /// Every regular file at or below `root`, with its metadata snapshot.
    pub fn collect_files(&self, root: &Path, cancel: &CancelToken) -> Result<Vec<FileRecord>> {
        let mut files = Vec::new();
        self.for_each_file(
            root,
            Parallelism::RayonNewPool(0), // 0 = use default thread count
            cancel,
            |path, metadata| files.push(FileRecord::from_metadata(path, metadata)),
        )?;
        Ok(files)
    }

    fn for_each_file<F>(
        &self,
        root: &Path,
        parallelism: Parallelism,
        cancel: &CancelToken,
        mut visit: F,
    ) -> Result<()>
    where
        F: FnMut(PathBuf, &fs::Metadata),
    {
        let authorizer = Arc::clone(&self.authorizer);
        let hidden = Arc::clone(&self.hidden);
        let pruning_cancel = cancel.clone();

        let walker = WalkDir::new(root)
            .parallelism(parallelism)
            .skip_hidden(false) // hidden entries go through HiddenPolicy instead
            .follow_links(false) // Don't follow symlinks to avoid loops
            .process_read_dir(move |_depth, _dir, _state, children| {
                if pruning_cancel.is_cancelled() {
                    children.clear();
                    return;
                }
                children.retain(|entry| match entry {
                    Ok(entry) => admits(&authorizer, &hidden, &entry.path(), &entry.file_name),
                    Err(_) => true,
                });
            });

        for entry_result in walker {
            cancel.check()?;

            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(root = %root.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            match entry.metadata() {
                Ok(metadata) => visit(entry.path(), &metadata),
                Err(e) => debug!(path = %entry.path().display(), error = %e, "skipping entry"),
            }
        }

        cancel.check()
    }
}

fn admits(authorizer: &PathAuthorizer, hidden: &HiddenPolicy, path: &Path, name: &OsStr) -> bool {
    if !hidden.allows(name) {
        return false;
    }
    if authorizer.is_blacklisted(path) {
        debug!(path = %path.display(), "pruning blacklisted entry");
        return false;
    }
    true
}
