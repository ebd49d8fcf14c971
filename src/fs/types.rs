use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// One node of a size tree.
///
/// A directory with expanded children has `size_bytes` equal to the sum of
/// its children. A depth-capped directory has `children == None` and a size
/// computed by flat aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryNode {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
    pub is_directory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<DirectoryNode>>,
}

impl DirectoryNode {
    pub fn file(path: PathBuf, size_bytes: u64) -> Self {
        Self {
            name: display_name(&path),
            path,
            size_bytes,
            is_directory: false,
            children: None,
        }
    }

    /// A directory whose size came from flat aggregation.
    pub fn collapsed_dir(path: PathBuf, size_bytes: u64) -> Self {
        Self {
            name: display_name(&path),
            path,
            size_bytes,
            is_directory: true,
            children: None,
        }
    }

    /// A directory with expanded children. The size is derived from them and
    /// children are ordered largest first, then by name.
    pub fn expanded_dir(path: PathBuf, mut children: Vec<DirectoryNode>) -> Self {
        children.sort_by(|a, b| {
            b.size_bytes
                .cmp(&a.size_bytes)
                .then_with(|| a.name.cmp(&b.name))
        });
        let size_bytes = children.iter().map(|c| c.size_bytes).sum();
        Self {
            name: display_name(&path),
            path,
            size_bytes,
            is_directory: true,
            children: Some(children),
        }
    }

    pub fn children(&self) -> &[DirectoryNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// True for files and for directories that were not expanded or are empty.
    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }

    /// Share of `total` taken by this node, in percent.
    pub fn percentage_of(&self, total: u64) -> f64 {
        if total == 0 {
            0.0
        } else {
            (self.size_bytes as f64 / total as f64) * 100.0
        }
    }

    /// Number of file nodes in this subtree. Collapsed directories count as zero.
    pub fn file_count(&self) -> usize {
        if !self.is_directory {
            return 1;
        }
        self.children().iter().map(DirectoryNode::file_count).sum()
    }

    /// Copy of the tree without zero-size nodes. Sizes are left untouched.
    pub fn without_empty(&self) -> Self {
        let children = self.children.as_ref().map(|children| {
            children
                .iter()
                .filter(|c| c.size_bytes > 0)
                .map(DirectoryNode::without_empty)
                .collect()
        });
        Self {
            path: self.path.clone(),
            name: self.name.clone(),
            size_bytes: self.size_bytes,
            is_directory: self.is_directory,
            children,
        }
    }
}

/// A regular file seen by a flat walk.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub accessed: Option<SystemTime>,
    /// `(device, inode)` where the platform provides one.
    pub identity: Option<(u64, u64)>,
}

impl FileRecord {
    pub fn from_metadata(path: PathBuf, metadata: &Metadata) -> Self {
        Self {
            path,
            size: metadata.len(),
            modified: metadata.modified().ok(),
            accessed: metadata.accessed().ok(),
            identity: file_identity(metadata),
        }
    }

    pub fn name(&self) -> String {
        display_name(&self.path)
    }
}

/// Final path component, or the whole path for roots like `/`.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(unix)]
fn file_identity(metadata: &Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((metadata.dev(), metadata.ino()))
}

#[cfg(not(unix))]
fn file_identity(_metadata: &Metadata) -> Option<(u64, u64)> {
    None
}
