// Cleanup categories and their fixed root locations

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::security::path_utils::expand_home;

/// A named class of cleanable location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    SystemCaches,
    UserCaches,
    Logs,
    Trash,
    Downloads,
    DeveloperCaches,
    BrowserData,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::SystemCaches,
        Category::UserCaches,
        Category::Logs,
        Category::Trash,
        Category::Downloads,
        Category::DeveloperCaches,
        Category::BrowserData,
    ];

    /// Most specific first. A later category never reports bytes an earlier
    /// one already claimed.
    pub const SCAN_ORDER: [Category; 7] = [
        Category::DeveloperCaches,
        Category::BrowserData,
        Category::Trash,
        Category::Downloads,
        Category::Logs,
        Category::UserCaches,
        Category::SystemCaches,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::SystemCaches => "System Caches",
            Self::UserCaches => "User Caches",
            Self::Logs => "Log Files",
            Self::Trash => "Trash",
            Self::Downloads => "Downloads",
            Self::DeveloperCaches => "Developer Caches",
            Self::BrowserData => "Browser Data",
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            Self::SystemCaches => "System-wide cache files",
            Self::UserCaches => "Per-application caches of the current user",
            Self::Logs => "Application and system logs",
            Self::Trash => "Files already moved to the trash",
            Self::Downloads => "Old files in the downloads folder",
            Self::DeveloperCaches => "npm, yarn, cargo, gradle, pip and build caches",
            Self::BrowserData => "Browser disk caches",
        }
    }

    /// Whether each direct child of a root is its own item. When false the
    /// root itself is the item.
    pub fn reports_children(&self) -> bool {
        !matches!(self, Self::DeveloperCaches)
    }
}

/// Root locations scanned for each category.
#[derive(Debug, Clone, Default)]
pub struct CategoryLocations {
    roots: BTreeMap<Category, Vec<PathBuf>>,
}

impl CategoryLocations {
    /// No roots at all. Combine with [`with_roots`](Self::with_roots).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in locations for this platform, anchored at `home`.
    pub fn for_platform(home: &Path) -> Self {
        let mut locations = Self::empty();
        for category in Category::ALL {
            let roots = platform_roots(category, home);
            locations = locations.with_roots(category, roots);
        }
        locations
    }

    /// Replace the roots of one category.
    pub fn with_roots<I>(mut self, category: Category, roots: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<PathBuf>,
    {
        self.roots
            .insert(category, roots.into_iter().map(Into::into).collect());
        self
    }

    /// Append developer cache roots. `~/` is expanded against `home`.
    pub fn with_extra_developer_caches<I>(mut self, home: &Path, entries: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<Path>,
    {
        let roots = self.roots.entry(Category::DeveloperCaches).or_default();
        for entry in entries {
            let root = expand_home(entry.as_ref(), home);
            if !roots.contains(&root) {
                roots.push(root);
            }
        }
        self
    }

    pub fn roots(&self, category: Category) -> &[PathBuf] {
        self.roots.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(target_os = "macos")]
fn platform_roots(category: Category, home: &Path) -> Vec<PathBuf> {
    match category {
        Category::SystemCaches => vec![PathBuf::from("/Library/Caches")],
        Category::UserCaches => vec![home.join("Library/Caches")],
        Category::Logs => vec![
            PathBuf::from("/Library/Logs"),
            PathBuf::from("/private/var/log"),
            home.join("Library/Logs"),
        ],
        Category::Trash => vec![home.join(".Trash")],
        Category::Downloads => vec![home.join("Downloads")],
        Category::DeveloperCaches => vec![
            home.join(".npm/_cacache"),
            home.join(".yarn/cache"),
            home.join(".pnpm-store"),
            home.join(".bun/install/cache"),
            home.join(".cargo/registry"),
            home.join(".gradle/caches"),
            home.join(".m2/repository"),
            home.join("Library/Caches/pip"),
            home.join("Library/Caches/go-build"),
            home.join("Library/Developer/Xcode/DerivedData"),
            home.join("Library/Developer/CoreSimulator/Caches"),
        ],
        Category::BrowserData => vec![
            home.join("Library/Caches/Google/Chrome"),
            home.join("Library/Caches/Chromium"),
            home.join("Library/Caches/Firefox"),
        ],
    }
}

#[cfg(not(target_os = "macos"))]
fn platform_roots(category: Category, home: &Path) -> Vec<PathBuf> {
    match category {
        Category::SystemCaches => vec![PathBuf::from("/var/cache")],
        Category::UserCaches => vec![home.join(".cache")],
        Category::Logs => vec![PathBuf::from("/var/log")],
        // Trashed payloads; the sibling `info/` only holds restore metadata
        Category::Trash => vec![home.join(".local/share/Trash/files")],
        Category::Downloads => vec![home.join("Downloads")],
        Category::DeveloperCaches => vec![
            home.join(".npm/_cacache"),
            home.join(".yarn/cache"),
            home.join(".pnpm-store"),
            home.join(".bun/install/cache"),
            home.join(".cargo/registry"),
            home.join(".gradle/caches"),
            home.join(".m2/repository"),
            home.join(".cache/pip"),
            home.join(".cache/go-build"),
        ],
        Category::BrowserData => vec![
            home.join(".cache/google-chrome"),
            home.join(".cache/chromium"),
            home.join(".cache/mozilla/firefox"),
        ],
    }
}
