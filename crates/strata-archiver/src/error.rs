//! Error types for the archiver.

use std::path::PathBuf;

use thiserror::Error;

use crate::cancel::CancelledError;

/// Result type alias for archiver operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Error variants for a snapshot run.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// An OS-level operation failed; carries the operation name and path.
    #[error("{op} {}: {source}", .path.display())]
    Io {
        /// The failing operation (open, lstat, readdir, ...).
        op: &'static str,
        /// The path the operation was applied to.
        path: PathBuf,
        /// The underlying OS error.
        source: std::io::Error,
    },

    /// The run was cancelled at a suspension point.
    #[error(transparent)]
    Cancelled(#[from] CancelledError),

    /// An entry opened for chunking turned out not to be a regular file.
    #[error("{} is not a regular file", .path.display())]
    NotRegularFile {
        /// The offending path.
        path: PathBuf,
    },

    /// An interior node of the virtual tree has no on-disk directory to
    /// take its metadata from.
    #[error("no file info path for {}/{name}", .prefix.display())]
    MissingFileInfoPath {
        /// Logical position of the parent.
        prefix: PathBuf,
        /// Logical name of the node.
        name: String,
    },

    /// A target resolved to no path components and was not expanded.
    #[error("target {target:?} has no path components")]
    InvalidTarget {
        /// The offending target string.
        target: String,
    },

    /// The snapshot was started without any targets.
    #[error("no targets given")]
    NoTargets,

    /// A repository or data-model operation failed.
    #[error(transparent)]
    Repo(#[from] strata_core::CoreError),
}

impl ArchiveError {
    /// Wrap an I/O error with the failing operation and path.
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}
