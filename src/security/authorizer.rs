// Path authorization: the single gate in front of every read into, and every
// removal of, a path that did not come from a hard-coded category location

use std::path::{Path, PathBuf};

use tracing::debug;

use super::path_utils::{canonicalize_entry, canonicalize_lenient, expand_home, has_parent_segment};
use super::policy::SafetyPolicy;
use crate::error::{Result, SurgeError};

/// Validates and canonicalizes paths against a [`SafetyPolicy`].
///
/// The authorizer holds no mutable state: the outcome for a given input is a
/// function of the filesystem and the fixed policy tables only.
#[derive(Debug, Clone)]
pub struct PathAuthorizer {
    policy: SafetyPolicy,
    quarantine_root: Option<PathBuf>,
}

impl PathAuthorizer {
    pub fn new(policy: SafetyPolicy) -> Self {
        Self {
            policy,
            quarantine_root: None,
        }
    }

    /// Authorizer with the built-in platform tables anchored at the current
    /// user's home directory.
    pub fn for_current_user() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| SurgeError::Config {
            message: "cannot determine the home directory".to_string(),
        })?;
        Ok(Self::new(SafetyPolicy::platform_default(home)))
    }

    /// Refuse deletion of the quarantine root and of anything containing it.
    pub fn with_quarantine_root(mut self, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let resolved = canonicalize_lenient(root).unwrap_or_else(|_| root.to_path_buf());
        self.quarantine_root = Some(resolved);
        self
    }

    pub fn policy(&self) -> &SafetyPolicy {
        &self.policy
    }

    pub fn home(&self) -> &Path {
        self.policy.home()
    }

    /// Authorize a raw, caller-supplied path string.
    ///
    /// Surrounding whitespace is ignored. Returns the canonical path, or the
    /// rejection reason.
    pub fn authorize(&self, raw: &str) -> Result<PathBuf> {
        self.authorize_path(Path::new(raw.trim()))
    }

    /// Authorize a path and apply every rule including the home-root rule.
    pub fn authorize_path(&self, path: &Path) -> Result<PathBuf> {
        let canonical = self.resolve(path, canonicalize_lenient)?;
        self.apply_rules(canonical, true)
    }

    /// Authorize a path as a scan root.
    ///
    /// Same as [`authorize_path`](Self::authorize_path) except that the home
    /// root itself is accepted: it may be walked, just never removed.
    pub fn authorize_for_reading(&self, path: &Path) -> Result<PathBuf> {
        let canonical = self.resolve(path, canonicalize_lenient)?;
        self.apply_rules(canonical, false)
    }

    /// Full authorization for a destructive operation.
    ///
    /// A trailing symlink is judged (and later removed) as the link itself.
    /// On top of the common rules, refuses the critical top-level
    /// directories (exact match), any directory containing a blacklisted
    /// prefix, and the quarantine root or any ancestor of it.
    pub fn authorize_for_deletion(&self, path: &Path) -> Result<PathBuf> {
        let canonical = self.resolve(path, canonicalize_entry)?;
        let canonical = self.apply_rules(canonical, true)?;

        if self
            .policy
            .critical_directories()
            .iter()
            .any(|critical| critical == &canonical)
        {
            debug!(path = %canonical.display(), "rejected critical directory");
            return Err(SurgeError::CriticalDirectory { path: canonical });
        }

        // Removing an ancestor would take the protected subtree with it.
        if let Some(protected) = self
            .policy
            .blacklist()
            .iter()
            .find(|prefix| prefix.starts_with(&canonical))
        {
            debug!(
                path = %canonical.display(),
                protected = %protected.display(),
                "rejected ancestor of a blacklisted path"
            );
            return Err(SurgeError::CriticalDirectory { path: canonical });
        }

        if let Some(quarantine) = &self.quarantine_root {
            if quarantine.starts_with(&canonical) {
                debug!(path = %canonical.display(), "rejected quarantine ancestor");
                return Err(SurgeError::CriticalDirectory { path: canonical });
            }
        }

        Ok(canonical)
    }

    pub fn is_safe_to_delete(&self, path: &Path) -> bool {
        self.authorize_for_deletion(path).is_ok()
    }

    /// Blacklist check for a path that is already canonical.
    ///
    /// Walkers never follow symlinks, so a child joined onto a canonical
    /// parent is canonical too and can be checked without touching the disk.
    pub fn check_descendant(&self, canonical: &Path) -> Result<()> {
        if self.is_blacklisted(canonical) {
            return Err(SurgeError::Blacklisted {
                path: canonical.to_path_buf(),
            });
        }
        Ok(())
    }

    /// Prefix match on whole components: `/usr/binaries` is not under `/usr/bin`.
    pub fn is_blacklisted(&self, canonical: &Path) -> bool {
        self.policy
            .blacklist()
            .iter()
            .any(|prefix| canonical.starts_with(prefix))
    }

    fn resolve(&self, path: &Path, canonicalize: fn(&Path) -> Result<PathBuf>) -> Result<PathBuf> {
        if path.as_os_str().is_empty() {
            return Err(SurgeError::EmptyPath);
        }
        let expanded = expand_home(path, self.policy.home());
        canonicalize(&expanded)
    }

    fn apply_rules(&self, canonical: PathBuf, protect_home: bool) -> Result<PathBuf> {
        if has_parent_segment(&canonical) {
            debug!(path = %canonical.display(), "rejected traversal");
            return Err(SurgeError::TraversalAttempt { path: canonical });
        }

        self.check_descendant(&canonical)?;

        if protect_home && canonical == self.policy.home() {
            debug!(path = %canonical.display(), "rejected home root");
            return Err(SurgeError::HomeRootProtected { path: canonical });
        }

        Ok(canonical)
    }
}
