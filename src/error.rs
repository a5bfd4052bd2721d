//! Error taxonomy shared by every [`crate::fs::FileSystem`] backend.

use thiserror::Error;

use crate::path::{PathError, UPath};

/// Result of filesystem operations with error type [`FsError`].
pub type FsResult<T> = std::result::Result<T, FsError>;

/// Failures surfaced by [`crate::fs::FileSystem`] operations.
///
/// Errors are never swallowed by the core; the only internal recovery is the
/// rollback of partially acquired locks before an error surfaces.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FsError {
    /// The path failed normalisation or carried a forbidden character.
    #[error(transparent)]
    InvalidPath(#[from] PathError),
    /// The target file does not exist.
    #[error("file '{0}' was not found")]
    FileNotFound(UPath),
    /// The target directory, or a directory on the way to the target, does
    /// not exist.
    #[error("directory '{0}' was not found")]
    DirectoryNotFound(UPath),
    /// The destination of a rename, a copy without overwrite or a
    /// create-new open already exists.
    #[error("'{0}' already exists")]
    AlreadyExists(UPath),
    /// A directory operand resolved to a file.
    #[error("'{0}' is not a directory")]
    NotADirectory(UPath),
    /// A file operand resolved to a directory.
    #[error("'{0}' is a directory")]
    IsADirectory(UPath),
    /// Non-recursive delete of a directory that still has children.
    #[error("directory '{0}' is not empty")]
    DirectoryNotEmpty(UPath),
    /// Read-only target, forbidden manipulation of the root, or an
    /// access-rule violation.
    #[error("access to '{0}' is denied")]
    Unauthorized(UPath),
    /// A non-blocking acquisition failed, or the requested share mode is
    /// incompatible with an existing open.
    #[error("'{0}' is busy")]
    Busy(UPath),
    /// An argument combination the operation cannot honour.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// Unrecoverable lower-level failure reported by a backend.
    #[error("i/o failure: {0}")]
    Io(String),
    /// The stream was already closed.
    #[error("the stream is closed")]
    Disposed,
}
