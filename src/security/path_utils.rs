// Path resolution helpers for the authorizer
// Home expansion, lenient canonicalization and lexical cleanup

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{is_symlink_loop, Result, SurgeError};

/// Expand a leading `~` or `~/` against `home`. Other paths are returned as-is.
pub fn expand_home(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) if rest.as_os_str().is_empty() => home.to_path_buf(),
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

/// Canonicalize a path, tolerating a missing final component.
///
/// If the path itself does not exist but its parent does, the result is the
/// canonical parent joined with the final name. This keeps a path that raced
/// away between scan and delete judged on its real location.
pub fn canonicalize_lenient(path: &Path) -> Result<PathBuf> {
    match path.canonicalize() {
        Ok(canonical) => Ok(canonical),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
                return Err(SurgeError::NotFound {
                    path: path.to_path_buf(),
                });
            };
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            match parent.canonicalize() {
                Ok(canonical_parent) => Ok(canonical_parent.join(name)),
                Err(_) => Err(SurgeError::NotFound {
                    path: path.to_path_buf(),
                }),
            }
        }
        Err(err) if is_symlink_loop(&err) => Err(SurgeError::TraversalAttempt {
            path: path.to_path_buf(),
        }),
        Err(err) => Err(SurgeError::from_io_error(
            err,
            "resolving path",
            Some(path.to_path_buf()),
        )),
    }
}

/// Like [`canonicalize_lenient`], but a final component that is a symlink is
/// kept as the link itself. Removing a link must never resolve to its target.
pub fn canonicalize_entry(path: &Path) -> Result<PathBuf> {
    match std::fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_symlink() => {
            let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
                return Err(SurgeError::EmptyPath);
            };
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            Ok(canonicalize_lenient(parent)?.join(name))
        }
        _ => canonicalize_lenient(path),
    }
}

/// True when any component is a `..` segment.
pub fn has_parent_segment(path: &Path) -> bool {
    path.components().any(|c| matches!(c, Component::ParentDir))
}

/// Canonical form of a policy table entry: resolved when it exists on this
/// machine, lexically cleaned otherwise.
pub fn normalize_policy_entry(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| clean_path(path))
}

/// Clean a path by removing redundant components like "." and ".."
/// This provides a normalized form without requiring the path to exist
pub fn clean_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => continue,
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                    continue;
                }
                // ".." directly under the root stays at the root
                if let Some(Component::RootDir) = components.last() {
                    continue;
                }
                components.push(component);
            }
            _ => components.push(component),
        }
    }

    let result: PathBuf = components.iter().collect();
    if result.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        result
    }
}
