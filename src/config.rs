//! Engine configuration.
//!
//! Loaded from TOML: an explicit path first, then
//! `<config dir>/surge/config.toml`, else built-in defaults. Safety floors
//! (age protection, size floor, built-in blacklist) are not configurable.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SurgeError};
use crate::fs::DEFAULT_ALLOWED_HIDDEN;
use crate::quarantine::DEFAULT_RETENTION_DAYS;

pub const CONFIG_DIR_NAME: &str = "surge";
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Root of the quarantine store.
    pub quarantine_dir: PathBuf,
    /// Default age, in days, at which a purge removes quarantined entries.
    pub retention_days: u64,
    /// Glob patterns of dotted entry names a walk may enter.
    pub allowed_hidden: Vec<String>,
    /// Protected prefixes added to the built-in blacklist. `~/` is allowed.
    pub extra_blacklist: Vec<PathBuf>,
    /// Developer cache roots added to the built-in list. `~/` is allowed.
    pub extra_developer_caches: Vec<PathBuf>,
    /// Worker count for duplicate hashing; the global pool when unset.
    pub hash_threads: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quarantine_dir: default_quarantine_dir(),
            retention_days: DEFAULT_RETENTION_DAYS,
            allowed_hidden: DEFAULT_ALLOWED_HIDDEN.iter().map(|s| s.to_string()).collect(),
            extra_blacklist: Vec::new(),
            extra_developer_caches: Vec::new(),
            hash_threads: None,
        }
    }
}

impl EngineConfig {
    /// Load from `explicit` when given (it must exist), otherwise from the
    /// default location when present, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                debug!("no configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SurgeError::Config {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        let config = Self::from_toml(&text).map_err(|e| match e {
            SurgeError::Config { message } => SurgeError::Config {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| SurgeError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.retention_days == 0 {
            return Err(SurgeError::Config {
                message: "retention_days must be positive".to_string(),
            });
        }
        if self.hash_threads == Some(0) {
            return Err(SurgeError::Config {
                message: "hash_threads must be positive".to_string(),
            });
        }
        if self.quarantine_dir.as_os_str().is_empty() {
            return Err(SurgeError::Config {
                message: "quarantine_dir must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

fn default_quarantine_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(std::env::temp_dir)
        .join(CONFIG_DIR_NAME)
        .join("quarantine")
}
