//! Depth-bounded disk usage trees for plain reporting and treemap input.

use std::ops::RangeInclusive;
use std::path::Path;

use tracing::info;

use super::types::DirectoryNode;
use super::walker::DirectoryTreeWalker;
use crate::cancel::CancelToken;
use crate::error::{Result, SurgeError};

/// Accepted values for a tree request's `max_depth`.
pub const DEPTH_RANGE: RangeInclusive<usize> = 1..=10;

#[derive(Debug, Clone)]
pub struct DiskTreeBuilder {
    walker: DirectoryTreeWalker,
}

impl DiskTreeBuilder {
    pub fn new(walker: DirectoryTreeWalker) -> Self {
        Self { walker }
    }

    /// Authorize `root` and build its size tree down to `max_depth`.
    pub fn scan_disk_tree(&self, root: &Path, max_depth: usize, cancel: &CancelToken) -> Result<DirectoryNode> {
        if !DEPTH_RANGE.contains(&max_depth) {
            return Err(SurgeError::invalid_request(format!(
                "max depth {} is outside {}..={}",
                max_depth,
                DEPTH_RANGE.start(),
                DEPTH_RANGE.end()
            )));
        }

        let root = self.walker.authorizer().authorize_for_reading(root)?;
        let tree = self.walker.tree(&root, max_depth, cancel)?;
        info!(
            root = %root.display(),
            max_depth,
            size = tree.size_bytes,
            files = tree.file_count(),
            "disk tree built"
        );
        Ok(tree)
    }

    /// Same tree as [`scan_disk_tree`](Self::scan_disk_tree) with zero-size
    /// nodes removed, ready for layout.
    pub fn scan_treemap_source(&self, root: &Path, max_depth: usize, cancel: &CancelToken) -> Result<DirectoryNode> {
        self.scan_disk_tree(root, max_depth, cancel)
            .map(|tree| tree.without_empty())
    }
}
