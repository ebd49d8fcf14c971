//! Cleaner module - category scanning and safe deletion
//!
//! Finds caches, logs, trash, downloads and developer-tool junk in fixed
//! per-platform locations, and removes selected items through the path
//! authorizer and the quarantine store.

pub mod category;
pub mod deleter;
pub mod describe;
pub mod scanner;

pub use category::{Category, CategoryLocations};
pub use deleter::{DeletionExecutor, DeletionReport};
pub use describe::{classify_download, describe, DownloadKind};
pub use scanner::{CandidateItem, CategoryScanner, AGE_PROTECTION_DAYS, MIN_ITEM_SIZE};
