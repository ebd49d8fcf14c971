//! Reversible deletion.
//!
//! Removed paths are moved under a single quarantine root as
//! `{unixTimestamp}_{originalName}` and expire after a retention window.
//! The root is the only on-disk state the engine owns.

use std::ffi::{OsStr, OsString};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local, TimeZone, Utc};
use filetime::FileTime;
use jwalk::WalkDir;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::error::{is_cross_device, Result, SurgeError};

/// Days a quarantined entry is kept before a purge may remove it.
pub const DEFAULT_RETENTION_DAYS: u64 = 30;

const MAX_SLOT_ATTEMPTS: u32 = 10_000;

/// Result of moving one path into quarantine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarantineRecord {
    pub original_path: PathBuf,
    pub quarantine_path: PathBuf,
    pub quarantined_at: DateTime<Local>,
    pub size: u64,
}

/// An entry currently present under the quarantine root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarantineEntry {
    pub path: PathBuf,
    /// Name with the timestamp prefix removed.
    pub original_name: String,
    /// Parsed from the name prefix; `None` for entries not created by the store.
    pub quarantined_at: Option<DateTime<Local>>,
    pub size_bytes: u64,
    pub is_directory: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeReport {
    pub removed: usize,
    pub freed_bytes: u64,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct QuarantineStore {
    root: PathBuf,
}

impl QuarantineStore {
    /// Open the store, creating the root if needed.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root).map_err(|e| {
            SurgeError::from_io_error(e, "creating quarantine root", Some(root.to_path_buf()))
        })?;
        let root = root.canonicalize().map_err(|e| {
            SurgeError::from_io_error(e, "resolving quarantine root", Some(root.to_path_buf()))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Move `path` into quarantine. `size` is recorded as given.
    ///
    /// The destination slot is claimed atomically before the move, so two
    /// concurrent quarantines of equally named paths never collide.
    pub fn quarantine(&self, path: &Path, size: u64) -> Result<QuarantineRecord> {
        let metadata = fs::symlink_metadata(path)
            .map_err(|e| SurgeError::from_io_error(e, "reading metadata", Some(path.to_path_buf())))?;
        let name = path.file_name().ok_or_else(|| SurgeError::OperationFailed {
            detail: format!("{} has no file name", path.display()),
        })?;

        let now = Utc::now();
        let is_dir = metadata.is_dir();
        let slot = self.claim_slot(now.timestamp(), name, is_dir)?;

        if let Err(e) = move_path(path, &slot, is_dir) {
            release_slot(&slot, is_dir);
            return Err(SurgeError::from_io_error(e, "moving into quarantine", Some(path.to_path_buf())));
        }

        // The retention window starts now, not at the entry's last edit.
        let stamp = FileTime::now();
        if let Err(e) = filetime::set_symlink_file_times(&slot, stamp, stamp) {
            warn!(path = %slot.display(), error = %e, "cannot reset quarantine timestamp");
        }

        debug!(from = %path.display(), to = %slot.display(), "quarantined");
        Ok(QuarantineRecord {
            original_path: path.to_path_buf(),
            quarantine_path: slot,
            quarantined_at: now.with_timezone(&Local),
            size,
        })
    }

    fn claim_slot(&self, timestamp: i64, name: &OsStr, is_dir: bool) -> Result<PathBuf> {
        for attempt in 0..MAX_SLOT_ATTEMPTS {
            let mut slot_name = OsString::from(format!("{}_", timestamp));
            slot_name.push(name);
            if attempt > 0 {
                slot_name.push(format!(" ({})", attempt));
            }
            let slot = self.root.join(slot_name);

            let claimed = if is_dir {
                fs::create_dir(&slot)
            } else {
                OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&slot)
                    .map(drop)
            };

            match claimed {
                Ok(()) => return Ok(slot),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(SurgeError::from_io_error(e, "claiming quarantine slot", Some(slot)));
                }
            }
        }
        Err(SurgeError::OperationFailed {
            detail: "no free quarantine slot".to_string(),
        })
    }

    /// Move a quarantined entry back to where it came from.
    ///
    /// Fails when the original location is occupied again.
    pub fn restore(&self, record: &QuarantineRecord) -> Result<()> {
        if !record.quarantine_path.starts_with(&self.root) {
            return Err(SurgeError::invalid_request(format!(
                "{} is not inside the quarantine root",
                record.quarantine_path.display()
            )));
        }
        let metadata = fs::symlink_metadata(&record.quarantine_path).map_err(|e| {
            SurgeError::from_io_error(e, "reading metadata", Some(record.quarantine_path.clone()))
        })?;
        if fs::symlink_metadata(&record.original_path).is_ok() {
            return Err(SurgeError::OperationFailed {
                detail: format!("{} already exists", record.original_path.display()),
            });
        }
        if let Some(parent) = record.original_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SurgeError::from_io_error(e, "recreating parent", Some(parent.to_path_buf()))
            })?;
        }

        move_path(&record.quarantine_path, &record.original_path, metadata.is_dir()).map_err(|e| {
            SurgeError::from_io_error(e, "restoring from quarantine", Some(record.original_path.clone()))
        })?;
        info!(path = %record.original_path.display(), "restored from quarantine");
        Ok(())
    }

    /// Entries currently in quarantine, oldest first.
    pub fn list(&self) -> Result<Vec<QuarantineEntry>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(SurgeError::from_io_error(e, "listing quarantine", Some(self.root.clone())));
            }
        };

        let mut listed = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(metadata) = fs::symlink_metadata(&path) else {
                continue;
            };
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let (quarantined_at, original_name) = parse_entry_name(&file_name);
            listed.push(QuarantineEntry {
                size_bytes: entry_size(&path, &metadata),
                is_directory: metadata.is_dir(),
                path,
                original_name,
                quarantined_at,
            });
        }

        listed.sort_by(|a, b| {
            a.quarantined_at
                .cmp(&b.quarantined_at)
                .then_with(|| a.path.cmp(&b.path))
        });
        Ok(listed)
    }

    /// Remove entries whose modification time is older than `older_than_days`.
    ///
    /// Only entries present when the sweep starts are considered, so it is
    /// safe to run while other requests quarantine new paths.
    pub fn purge(&self, older_than_days: u64, cancel: &CancelToken) -> Result<PurgeReport> {
        if older_than_days == 0 {
            return Err(SurgeError::invalid_request("older-than days must be positive"));
        }

        let mut report = PurgeReport::default();
        let snapshot: Vec<PathBuf> = match fs::read_dir(&self.root) {
            Ok(entries) => entries.flatten().map(|e| e.path()).collect(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(report),
            Err(e) => {
                return Err(SurgeError::from_io_error(e, "listing quarantine", Some(self.root.clone())));
            }
        };

        let cutoff = SystemTime::now()
            .checked_sub(Duration::from_secs(older_than_days.saturating_mul(86_400)))
            .unwrap_or(SystemTime::UNIX_EPOCH);

        for path in snapshot {
            cancel.check()?;

            let Ok(metadata) = fs::symlink_metadata(&path) else {
                continue; // removed by someone else since the snapshot
            };
            let Ok(modified) = metadata.modified() else {
                continue;
            };
            if modified > cutoff {
                continue;
            }

            let size = entry_size(&path, &metadata);
            let removed = if metadata.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };

            match removed {
                Ok(()) => {
                    report.removed += 1;
                    report.freed_bytes += size;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "purge failed");
                    report
                        .errors
                        .push(SurgeError::from_io_error(e, "purging", Some(path)).to_string());
                }
            }
        }

        info!(
            removed = report.removed,
            freed = report.freed_bytes,
            errors = report.errors.len(),
            "quarantine purged"
        );
        Ok(report)
    }
}

/// Split `{timestamp}_{name}` into its parts.
fn parse_entry_name(file_name: &str) -> (Option<DateTime<Local>>, String) {
    let Some((prefix, rest)) = file_name.split_once('_') else {
        return (None, file_name.to_string());
    };
    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_digit()) {
        return (None, file_name.to_string());
    }
    let at = prefix
        .parse::<i64>()
        .ok()
        .and_then(|secs| Local.timestamp_opt(secs, 0).single());
    match at {
        Some(at) => (Some(at), rest.to_string()),
        None => (None, file_name.to_string()),
    }
}

fn entry_size(path: &Path, metadata: &fs::Metadata) -> u64 {
    if !metadata.is_dir() {
        return metadata.len();
    }
    WalkDir::new(path)
        .skip_hidden(false)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

/// Rename, falling back to copy-then-remove across filesystems.
fn move_path(from: &Path, to: &Path, is_dir: bool) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            debug!(from = %from.display(), "cross-device move, copying");
            if is_dir {
                copy_dir_recursive(from, to)?;
                fs::remove_dir_all(from)
            } else {
                copy_entry(from, to)?;
                fs::remove_file(from)
            }
        }
        Err(e) => Err(e),
    }
}

fn release_slot(slot: &Path, is_dir: bool) {
    let released = if is_dir {
        fs::remove_dir(slot)
    } else {
        fs::remove_file(slot)
    };
    if let Err(e) = released {
        warn!(path = %slot.display(), error = %e, "cannot release quarantine slot");
    }
}

fn copy_dir_recursive(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;

    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let from_path = entry.path();
        let to_path = to.join(entry.file_name());

        if file_type.is_dir() {
            copy_dir_recursive(&from_path, &to_path)?;
        } else {
            copy_entry(&from_path, &to_path)?;
        }
    }

    Ok(())
}

/// Copy a file, or recreate a symlink without following it.
fn copy_entry(from: &Path, to: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(from)?;
    if metadata.file_type().is_symlink() {
        #[cfg(unix)]
        {
            let target = fs::read_link(from)?;
            if fs::symlink_metadata(to).is_ok() {
                fs::remove_file(to)?;
            }
            return std::os::unix::fs::symlink(target, to);
        }
    }
    fs::copy(from, to).map(drop)
}
