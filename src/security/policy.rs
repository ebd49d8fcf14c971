// Fixed protection tables for the path authorizer
// Any change to these lists must be reviewed: they gate every destructive operation

use std::path::{Path, PathBuf};

use super::path_utils::{expand_home, normalize_policy_entry};

/// Operating-system-critical prefixes. A path equal to or nested under any of
/// these is never read into or removed.
#[cfg(target_os = "macos")]
pub static BLACKLISTED_PATHS: &[&str] = &[
    "/System",
    "/bin",
    "/sbin",
    "/usr/bin",
    "/usr/sbin",
    "/usr/lib",
    "/usr/libexec",
    "/usr/share",
    "/etc",
    "/dev",
    "/private/etc",
    "/private/var/db",
    "/private/var/vm",
    "/Library/Apple",
    "/Library/Frameworks",
    "/Library/Extensions",
    "/cores",
    "/Network",
    "/.vol",
];

#[cfg(not(target_os = "macos"))]
pub static BLACKLISTED_PATHS: &[&str] = &[
    "/bin",
    "/sbin",
    "/usr/bin",
    "/usr/sbin",
    "/usr/lib",
    "/usr/lib32",
    "/usr/lib64",
    "/usr/libexec",
    "/usr/share",
    "/usr/include",
    "/lib",
    "/lib32",
    "/lib64",
    "/etc",
    "/dev",
    "/proc",
    "/sys",
    "/boot",
    "/run",
    "/var/lib",
    "/var/log/journal",
];

/// Top-level roots that may be scanned but never removed as a whole.
#[cfg(target_os = "macos")]
pub static CRITICAL_DIRECTORIES: &[&str] = &[
    "/",
    "/Applications",
    "/Library",
    "/Users",
    "/System",
    "/private/var",
    "/private/tmp",
    "/Volumes",
    "/usr",
    "/opt",
];

#[cfg(not(target_os = "macos"))]
pub static CRITICAL_DIRECTORIES: &[&str] = &[
    "/", "/home", "/usr", "/var", "/opt", "/tmp", "/srv", "/mnt", "/media",
];

/// Policy tables held by a [`super::PathAuthorizer`].
///
/// Every entry is stored in canonical form (resolved when it exists, lexically
/// cleaned otherwise) so that prefix checks compare like with like.
#[derive(Debug, Clone)]
pub struct SafetyPolicy {
    home: PathBuf,
    blacklist: Vec<PathBuf>,
    critical: Vec<PathBuf>,
}

impl SafetyPolicy {
    /// Build a policy from explicit tables. Used by tests and embedders that
    /// sandbox the engine under a different root.
    pub fn new<B, C>(home: impl AsRef<Path>, blacklist: B, critical: C) -> Self
    where
        B: IntoIterator,
        B::Item: AsRef<Path>,
        C: IntoIterator,
        C::Item: AsRef<Path>,
    {
        let home = normalize_policy_entry(home.as_ref());
        let blacklist = blacklist
            .into_iter()
            .map(|entry| normalize_policy_entry(&expand_home(entry.as_ref(), &home)))
            .collect();
        let critical = critical
            .into_iter()
            .map(|entry| normalize_policy_entry(&expand_home(entry.as_ref(), &home)))
            .collect();

        Self {
            home,
            blacklist,
            critical,
        }
    }

    /// The built-in tables for this platform, anchored at `home`.
    pub fn platform_default(home: impl AsRef<Path>) -> Self {
        Self::new(home, BLACKLISTED_PATHS, CRITICAL_DIRECTORIES)
    }

    /// Add protected prefixes on top of the existing blacklist. Entries may
    /// start with `~/`. Built-in entries cannot be removed.
    pub fn with_extra_blacklist<I>(mut self, entries: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<Path>,
    {
        for entry in entries {
            let normalized = normalize_policy_entry(&expand_home(entry.as_ref(), &self.home));
            if !self.blacklist.contains(&normalized) {
                self.blacklist.push(normalized);
            }
        }
        self
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn blacklist(&self) -> &[PathBuf] {
        &self.blacklist
    }

    pub fn critical_directories(&self) -> &[PathBuf] {
        &self.critical
    }
}
