//! Request/reply contract and the service facade behind it.
//!
//! [`Engine`] owns one instance of every service, built from explicit policy
//! tables and configuration. It keeps no state between requests apart from
//! the quarantine root on disk.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info_span, warn};

use crate::cancel::CancelToken;
use crate::cleaner::{CandidateItem, Category, CategoryLocations, CategoryScanner, DeletionExecutor, DeletionReport};
use crate::config::EngineConfig;
use crate::error::{Result, SurgeError};
use crate::fs::{DirectoryNode, DirectoryTreeWalker, DiskTreeBuilder, HiddenPolicy};
use crate::hash::{DuplicateDetector, DuplicateGroup};
use crate::large_files::{LargeFileRecord, LargeOldFileDetector};
use crate::quarantine::{PurgeReport, QuarantineEntry, QuarantineRecord, QuarantineStore};
use crate::security::{PathAuthorizer, SafetyPolicy};

/// One request, as carried by any transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    ScanCategories {
        categories: BTreeSet<Category>,
    },
    DeletePaths {
        paths: Vec<PathBuf>,
        #[serde(default = "default_use_quarantine")]
        use_quarantine: bool,
    },
    ScanDiskTree {
        root_path: PathBuf,
        max_depth: usize,
    },
    ScanTreeMapSource {
        root_path: PathBuf,
        max_depth: usize,
    },
    FindDuplicates {
        roots: Vec<PathBuf>,
        min_size: u64,
    },
    FindLargeOldFiles {
        roots: Vec<PathBuf>,
        min_size: u64,
        min_age_days: u64,
    },
    PurgeQuarantine {
        #[serde(default)]
        older_than_days: Option<u64>,
    },
    ListQuarantine,
}

fn default_use_quarantine() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum Response {
    Candidates(Vec<CandidateItem>),
    Deletion(DeletionReport),
    Tree(DirectoryNode),
    Duplicates(Vec<DuplicateGroup>),
    LargeFiles(Vec<LargeFileRecord>),
    Purge(PurgeReport),
    Quarantine(Vec<QuarantineEntry>),
    Error(ErrorReply),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub code: String,
    pub message: String,
}

impl From<&SurgeError> for ErrorReply {
    fn from(err: &SurgeError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Engine {
    authorizer: Arc<PathAuthorizer>,
    scanner: CategoryScanner,
    trees: DiskTreeBuilder,
    duplicates: DuplicateDetector,
    large_files: LargeOldFileDetector,
    deleter: DeletionExecutor,
    retention_days: u64,
}

impl Engine {
    /// Engine for the current user with the platform tables.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| SurgeError::Config {
            message: "cannot determine the home directory".to_string(),
        })?;
        Self::with_parts(
            SafetyPolicy::platform_default(&home),
            CategoryLocations::for_platform(&home),
            config,
        )
    }

    /// Engine over explicit policy tables and category roots.
    pub fn with_parts(policy: SafetyPolicy, locations: CategoryLocations, config: &EngineConfig) -> Result<Self> {
        let store = QuarantineStore::open(&config.quarantine_dir)?;

        let policy = policy.with_extra_blacklist(&config.extra_blacklist);
        let locations = locations.with_extra_developer_caches(policy.home(), &config.extra_developer_caches);
        let authorizer = Arc::new(PathAuthorizer::new(policy).with_quarantine_root(store.root()));
        let hidden = Arc::new(HiddenPolicy::from_patterns(&config.allowed_hidden)?);
        let walker = DirectoryTreeWalker::new(Arc::clone(&authorizer), hidden);

        let mut duplicates = DuplicateDetector::new(walker.clone());
        if let Some(threads) = config.hash_threads {
            duplicates = duplicates.with_threads(threads);
        }

        Ok(Self {
            scanner: CategoryScanner::new(walker.clone(), locations),
            trees: DiskTreeBuilder::new(walker.clone()),
            large_files: LargeOldFileDetector::new(walker.clone()),
            deleter: DeletionExecutor::new(Arc::clone(&authorizer), walker, store),
            duplicates,
            authorizer,
            retention_days: config.retention_days,
        })
    }

    pub fn authorizer(&self) -> &PathAuthorizer {
        &self.authorizer
    }

    pub fn quarantine(&self) -> &QuarantineStore {
        self.deleter.store()
    }

    pub fn scan_categories(&self, categories: &BTreeSet<Category>, cancel: &CancelToken) -> Result<Vec<CandidateItem>> {
        let _span = info_span!("scan_categories", count = categories.len()).entered();
        self.scanner.scan(categories, cancel)
    }

    pub fn delete_paths<P: AsRef<Path>>(
        &self,
        paths: &[P],
        use_quarantine: bool,
        cancel: &CancelToken,
    ) -> Result<DeletionReport> {
        let _span = info_span!("delete_paths", count = paths.len(), use_quarantine).entered();
        self.deleter.delete(paths, use_quarantine, cancel)
    }

    pub fn scan_disk_tree(&self, root: &Path, max_depth: usize, cancel: &CancelToken) -> Result<DirectoryNode> {
        let _span = info_span!("scan_disk_tree", root = %root.display(), max_depth).entered();
        self.trees.scan_disk_tree(root, max_depth, cancel)
    }

    pub fn scan_treemap_source(&self, root: &Path, max_depth: usize, cancel: &CancelToken) -> Result<DirectoryNode> {
        let _span = info_span!("scan_treemap_source", root = %root.display(), max_depth).entered();
        self.trees.scan_treemap_source(root, max_depth, cancel)
    }

    pub fn find_duplicates<P: AsRef<Path>>(
        &self,
        roots: &[P],
        min_size: u64,
        cancel: &CancelToken,
    ) -> Result<Vec<DuplicateGroup>> {
        let _span = info_span!("find_duplicates", roots = roots.len(), min_size).entered();
        self.duplicates.find_duplicates(roots, min_size, cancel)
    }

    pub fn find_large_old_files<P: AsRef<Path>>(
        &self,
        roots: &[P],
        min_size: u64,
        min_age_days: u64,
        cancel: &CancelToken,
    ) -> Result<Vec<LargeFileRecord>> {
        let _span = info_span!("find_large_old_files", roots = roots.len(), min_size, min_age_days).entered();
        self.large_files.find(roots, min_size, min_age_days, cancel)
    }

    /// Purge quarantined entries older than `older_than_days`, or the
    /// configured retention when `None`.
    pub fn purge_quarantine(&self, older_than_days: Option<u64>, cancel: &CancelToken) -> Result<PurgeReport> {
        let days = older_than_days.unwrap_or(self.retention_days);
        let _span = info_span!("purge_quarantine", days).entered();
        self.quarantine().purge(days, cancel)
    }

    pub fn list_quarantine(&self) -> Result<Vec<QuarantineEntry>> {
        let _span = info_span!("list_quarantine").entered();
        self.quarantine().list()
    }

    pub fn restore(&self, record: &QuarantineRecord) -> Result<()> {
        let _span = info_span!("restore", path = %record.original_path.display()).entered();
        self.quarantine().restore(record)
    }

    /// Execute one request. Failures become [`Response::Error`].
    pub fn handle(&self, request: Request, cancel: &CancelToken) -> Response {
        let outcome = match request {
            Request::ScanCategories { categories } => {
                self.scan_categories(&categories, cancel).map(Response::Candidates)
            }
            Request::DeletePaths { paths, use_quarantine } => {
                self.delete_paths(&paths, use_quarantine, cancel).map(Response::Deletion)
            }
            Request::ScanDiskTree { root_path, max_depth } => {
                self.scan_disk_tree(&root_path, max_depth, cancel).map(Response::Tree)
            }
            Request::ScanTreeMapSource { root_path, max_depth } => {
                self.scan_treemap_source(&root_path, max_depth, cancel).map(Response::Tree)
            }
            Request::FindDuplicates { roots, min_size } => {
                self.find_duplicates(&roots, min_size, cancel).map(Response::Duplicates)
            }
            Request::FindLargeOldFiles {
                roots,
                min_size,
                min_age_days,
            } => self
                .find_large_old_files(&roots, min_size, min_age_days, cancel)
                .map(Response::LargeFiles),
            Request::PurgeQuarantine { older_than_days } => {
                self.purge_quarantine(older_than_days, cancel).map(Response::Purge)
            }
            Request::ListQuarantine => self.list_quarantine().map(Response::Quarantine),
        };

        outcome.unwrap_or_else(|err| {
            warn!(code = err.code(), error = %err, "request failed");
            Response::Error(ErrorReply::from(&err))
        })
    }
}
