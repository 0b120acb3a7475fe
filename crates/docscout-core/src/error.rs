//! Error types for discovery operations.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a scan stopped before completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// The caller's cancellation token fired.
    Requested,
    /// The request deadline elapsed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => write!(f, "cancelled by caller"),
            Self::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

/// Errors that can end a discovery call.
///
/// Only root-level failures, cancellation and (in fail-fast mode) entry read
/// failures escape the engine. Everything else is recorded as an
/// [`EntryWarning`].
#[derive(Debug, Error)]
pub enum DiscoverError {
    /// Root path is missing or not a directory.
    #[error("Invalid root {path}: {reason}")]
    InvalidRoot { path: PathBuf, reason: &'static str },

    /// The root exists but could not be opened or inspected.
    #[error("I/O error at root {path}: {source}")]
    RootIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An entry could not be read and the scan runs in fail-fast mode.
    #[error("Failed to read {path}: {message}")]
    EntryRead { path: PathBuf, message: String },

    /// The scan did not complete. Partial results are discarded.
    #[error("Scan cancelled: {reason}")]
    Cancelled { reason: CancelReason },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A pipeline task failed unexpectedly.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DiscoverError {
    /// Classify an I/O error raised while opening the root.
    pub fn root_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::InvalidRoot {
                path,
                reason: "path does not exist",
            },
            std::io::ErrorKind::NotADirectory => Self::InvalidRoot {
                path,
                reason: "not a directory",
            },
            _ => Self::RootIo { path, source },
        }
    }

    /// Shorthand for a root that exists but is not a directory.
    pub fn not_a_directory(path: impl Into<PathBuf>) -> Self {
        Self::InvalidRoot {
            path: path.into(),
            reason: "not a directory",
        }
    }

    /// True when the caller supplied a bad root (a client error).
    pub fn is_invalid_root(&self) -> bool {
        matches!(self, Self::InvalidRoot { .. })
    }

    /// True when the scan was cancelled or timed out.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Kind of non-fatal entry problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// Error reading a file or directory.
    ReadError,
    /// A symlink loop was detected while following links.
    Loop,
}

/// Non-fatal problem encountered while walking the tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryWarning {
    /// Path where the problem occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl EntryWarning {
    /// Create a new entry warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Build a warning from an I/O error, picking the kind from the error.
    pub fn from_io(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let kind = match error.kind() {
            std::io::ErrorKind::PermissionDenied => WarningKind::PermissionDenied,
            _ => WarningKind::ReadError,
        };
        Self::new(path, error.to_string(), kind)
    }

    /// Convert this warning into the error raised in fail-fast mode.
    pub fn into_error(self) -> DiscoverError {
        DiscoverError::EntryRead {
            path: self.path,
            message: self.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_io_not_found_is_invalid_root() {
        let err = DiscoverError::root_io(
            "/missing",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_invalid_root());
    }

    #[test]
    fn test_root_io_permission_is_fatal_io() {
        let err = DiscoverError::root_io(
            "/locked",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, DiscoverError::RootIo { .. }));
        assert!(!err.is_invalid_root());
    }

    #[test]
    fn test_warning_kind_from_io() {
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let warning = EntryWarning::from_io("/a", &denied);
        assert_eq!(warning.kind, WarningKind::PermissionDenied);

        let other = std::io::Error::other("boom");
        let warning = EntryWarning::from_io("/b", &other);
        assert_eq!(warning.kind, WarningKind::ReadError);
        assert!(matches!(warning.into_error(), DiscoverError::EntryRead { .. }));
    }

    #[test]
    fn test_cancel_display() {
        let err = DiscoverError::Cancelled {
            reason: CancelReason::DeadlineExceeded,
        };
        assert!(err.is_cancelled());
        assert_eq!(err.to_string(), "Scan cancelled: deadline exceeded");
    }
}
