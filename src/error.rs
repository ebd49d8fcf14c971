// Centralized error handling module
// One error type shared by the authorizer, scanners, quarantine and engine

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the cleanup engine.
///
/// The first five variants are authorization rejections: they are produced by
/// [`crate::security::PathAuthorizer`] and never touch the filesystem beyond
/// resolving the path. Display strings are short enough to be placed verbatim
/// into a deletion report's error list.
#[derive(Debug, Error)]
pub enum SurgeError {
    #[error("empty or invalid path")]
    EmptyPath,

    #[error("{}: path traversal detected", path.display())]
    TraversalAttempt { path: PathBuf },

    #[error("{}: path is blacklisted", path.display())]
    Blacklisted { path: PathBuf },

    #[error("{}: the home directory itself cannot be deleted", path.display())]
    HomeRootProtected { path: PathBuf },

    #[error("{}: critical directory is protected", path.display())]
    CriticalDirectory { path: PathBuf },

    #[error("{}: no such file or directory", path.display())]
    NotFound { path: PathBuf },

    #[error("{}: permission denied while {operation}", path.display())]
    PermissionDenied { path: PathBuf, operation: String },

    #[error("operation failed: {detail}")]
    OperationFailed { detail: String },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, SurgeError>;

impl SurgeError {
    /// Create an error from an io::Error with context about the operation and path
    pub fn from_io_error(err: io::Error, operation: &str, path: Option<PathBuf>) -> Self {
        match (err.kind(), path) {
            (io::ErrorKind::NotFound, Some(path)) => SurgeError::NotFound { path },
            (io::ErrorKind::PermissionDenied, Some(path)) => SurgeError::PermissionDenied {
                path,
                operation: operation.to_string(),
            },
            (_, Some(path)) => SurgeError::OperationFailed {
                detail: format!("{} while {}: {}", path.display(), operation, err),
            },
            (_, None) => SurgeError::OperationFailed {
                detail: format!("{}: {}", operation, err),
            },
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        SurgeError::InvalidRequest {
            message: message.into(),
        }
    }

    /// Stable identifier for replies carried over a transport
    pub fn code(&self) -> &'static str {
        match self {
            SurgeError::EmptyPath => "emptyPath",
            SurgeError::TraversalAttempt { .. } => "traversalAttempt",
            SurgeError::Blacklisted { .. } => "blacklisted",
            SurgeError::HomeRootProtected { .. } => "homeRootProtected",
            SurgeError::CriticalDirectory { .. } => "criticalDirectory",
            SurgeError::NotFound { .. } => "notFound",
            SurgeError::PermissionDenied { .. } => "permissionDenied",
            SurgeError::OperationFailed { .. } | SurgeError::Io(_) => "operationFailed",
            SurgeError::InvalidRequest { .. } => "invalidRequest",
            SurgeError::Cancelled => "cancelled",
            SurgeError::Config { .. } => "config",
        }
    }

    /// True for outcomes of the path authorizer (as opposed to execution failures)
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            SurgeError::EmptyPath
                | SurgeError::TraversalAttempt { .. }
                | SurgeError::Blacklisted { .. }
                | SurgeError::HomeRootProtected { .. }
                | SurgeError::CriticalDirectory { .. }
        )
    }
}

/// `rename` refused because source and target are on different filesystems.
pub(crate) fn is_cross_device(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::CrossesDevices
}

/// Path resolution hit too many levels of symbolic links.
#[cfg(unix)]
pub(crate) fn is_symlink_loop(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::ELOOP)
}

#[cfg(not(unix))]
pub(crate) fn is_symlink_loop(_err: &io::Error) -> bool {
    false
}
