//! Hidden-entry policy for walks.
//!
//! Dotted entries are skipped unless their name matches one of the allowed
//! glob patterns (trash directories, conventionally dotted package caches).

use std::ffi::OsStr;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::{Result, SurgeError};

/// Default dotted names a walk may enter.
pub const DEFAULT_ALLOWED_HIDDEN: &[&str] = &[
    // Trash
    ".Trash",
    ".Trash-*",
    // Package manager and toolchain caches
    ".cache",
    ".npm",
    ".yarn",
    ".cargo",
    ".gradle",
    ".m2",
    ".pub-cache",
    ".rustup",
    ".bun",
    ".pnpm-store",
    // Per-user data roots holding caches
    ".local",
    ".mozilla",
];

/// Matches entry names against the allowed hidden patterns.
#[derive(Debug, Clone)]
pub struct HiddenPolicy {
    /// Compiled glob set for matching.
    glob_set: GlobSet,
    /// Raw pattern strings (for display/serialization).
    patterns: Vec<String>,
}

impl Default for HiddenPolicy {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl HiddenPolicy {
    /// Policy that allows no hidden entry at all.
    pub fn deny_all() -> Self {
        Self {
            glob_set: GlobSet::empty(),
            patterns: Vec::new(),
        }
    }

    /// Policy with [`DEFAULT_ALLOWED_HIDDEN`].
    pub fn with_defaults() -> Self {
        let mut builder = GlobSetBuilder::new();
        let mut patterns = Vec::new();

        for pattern in DEFAULT_ALLOWED_HIDDEN {
            if let Ok(glob) = Glob::new(pattern) {
                builder.add(glob);
                patterns.push(pattern.to_string());
            }
        }

        Self {
            glob_set: builder.build().unwrap_or_else(|_| GlobSet::empty()),
            patterns,
        }
    }

    /// Create from a list of patterns. An invalid glob is a configuration error.
    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        let mut pattern_list = Vec::new();

        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = Glob::new(pattern).map_err(|e| SurgeError::Config {
                message: format!("invalid hidden pattern '{}': {}", pattern, e),
            })?;
            builder.add(glob);
            pattern_list.push(pattern.to_string());
        }

        let glob_set = builder.build().map_err(|e| SurgeError::Config {
            message: format!("cannot compile hidden patterns: {}", e),
        })?;

        Ok(Self {
            glob_set,
            patterns: pattern_list,
        })
    }

    /// True when an entry with this name may be visited.
    ///
    /// Names that do not start with a dot are always allowed.
    pub fn allows(&self, name: &OsStr) -> bool {
        let name = name.to_string_lossy();
        if !name.starts_with('.') {
            return true;
        }
        self.glob_set.is_match(name.as_ref())
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}
