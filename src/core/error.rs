//! Defines the custom error types for the `core` module.

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced while locating the target of a `.lnk` shortcut.
///
/// The resolver never returns a best-guess path: every unmet validation
/// step maps to one of these variants.
#[derive(Debug, Error)]
pub enum ShortcutError {
    /// The buffer is too short or does not start with the shortcut magic byte.
    #[error("Not a valid shortcut file: {0}")]
    InvalidFormat(String),

    /// No plausible drive-letter path could be located in the buffer.
    #[error("No target path found in shortcut")]
    TargetNotFound,

    /// A target path was decoded but does not exist on disk.
    #[error("Shortcut target does not exist: {0}")]
    TargetMissing(String),

    /// The target exists but is a file. Callers open the shortcut itself instead.
    #[error("Shortcut target is not a folder: {0}")]
    NotADirectory(String),

    /// The shortcut file itself could not be read.
    #[error("I/O error for shortcut {1}: {0}")]
    Io(#[source] std::io::Error, PathBuf),
}

/// The primary error type for the `core` module.
///
/// This enum encapsulates all possible errors that can occur during
/// listing, mutation and shortcut resolution.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The requested path does not exist.
    #[error("Path does not exist: {0}")]
    NotFound(PathBuf),

    /// Represents a path that was expected to be a directory but was not.
    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A file or folder was to be created where something already exists.
    #[error("Path already exists: {0}")]
    AlreadyExists(PathBuf),

    /// The OS refused access to the path.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The source of a rename, copy or move is gone.
    #[error("Source path does not exist: {0}")]
    SourceMissing(PathBuf),

    /// The destination of a rename or move is already taken.
    #[error("Destination already exists: {0}")]
    DestinationExists(PathBuf),

    /// A directory would be copied or moved into itself.
    #[error("Cannot place {0} inside itself ({1})")]
    RecursiveDestination(PathBuf, PathBuf),

    /// A shortcut could not be resolved.
    #[error(transparent)]
    Shortcut(#[from] ShortcutError),

    /// Represents an unexpected I/O error, typically from file system operations.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] std::io::Error, PathBuf),
}

/// Stable, machine-readable classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    NotFound,
    NotADirectory,
    AlreadyExists,
    PermissionDenied,
    SourceMissing,
    DestinationExists,
    RecursiveDestination,
    InvalidFormat,
    TargetNotFound,
    TargetMissing,
    IoFailure,
    InvalidRequest,
    Timeout,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "notFound",
            Self::NotADirectory => "notADirectory",
            Self::AlreadyExists => "alreadyExists",
            Self::PermissionDenied => "permissionDenied",
            Self::SourceMissing => "sourceMissing",
            Self::DestinationExists => "destinationExists",
            Self::RecursiveDestination => "recursiveDestination",
            Self::InvalidFormat => "invalidFormat",
            Self::TargetNotFound => "targetNotFound",
            Self::TargetMissing => "targetMissing",
            Self::IoFailure => "ioFailure",
            Self::InvalidRequest => "invalidRequest",
            Self::Timeout => "timeout",
        }
    }
}

impl ShortcutError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidFormat(_) => ErrorKind::InvalidFormat,
            Self::TargetNotFound => ErrorKind::TargetNotFound,
            Self::TargetMissing(_) => ErrorKind::TargetMissing,
            Self::NotADirectory(_) => ErrorKind::NotADirectory,
            Self::Io(e, _) if e.kind() == std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            Self::Io(..) => ErrorKind::IoFailure,
        }
    }
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::NotADirectory(_) => ErrorKind::NotADirectory,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::SourceMissing(_) => ErrorKind::SourceMissing,
            Self::DestinationExists(_) => ErrorKind::DestinationExists,
            Self::RecursiveDestination(..) => ErrorKind::RecursiveDestination,
            Self::Shortcut(e) => e.kind(),
            Self::Io(..) => ErrorKind::IoFailure,
        }
    }

    /// Wraps an OS error, promoting the kinds the taxonomy names explicitly.
    pub fn from_io(err: std::io::Error, path: &Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::AlreadyExists => Self::AlreadyExists(path.to_path_buf()),
            _ => Self::Io(err, path.to_path_buf()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_from_io_promotes_known_kinds() {
        let path = Path::new("/tmp/x");
        let err = CoreError::from_io(io::Error::from(io::ErrorKind::NotFound), path);
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = CoreError::from_io(io::Error::from(io::ErrorKind::PermissionDenied), path);
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        let err = CoreError::from_io(io::Error::other("disk on fire"), path);
        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn test_shortcut_errors_keep_their_kind_through_core_error() {
        let err: CoreError = ShortcutError::TargetNotFound.into();
        assert_eq!(err.kind(), ErrorKind::TargetNotFound);
        assert_eq!(err.kind().as_str(), "targetNotFound");
    }
}
