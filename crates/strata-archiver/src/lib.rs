//! Incremental snapshotting archiver.
//!
//! Turns a set of filesystem targets into a content-addressed,
//! deduplicated snapshot stored in a [`strata_core::Repository`].
//!
//! Pipeline: targets → resolver → virtual archive tree → recursive save
//! (directory + file archiver, consulting the parent snapshot for reuse)
//! → repository flush → snapshot record.
//!
//! The archiver is single-threaded and synchronous per run; a
//! [`CancelToken`] threads through every I/O-bearing operation and is
//! observed at defined suspension points.

pub mod archiver;
pub mod cancel;
pub mod chunker;
pub mod error;
pub mod fs;
pub mod resolve;
pub mod tree;

pub use archiver::{file_changed, Archiver, Options, ReportAction, ReportFn, SelectFn};
pub use cancel::{new_cancel_pair, CancelHandle, CancelToken, CancelledError};
pub use chunker::{Chunk, ChunkStream};
pub use error::{ArchiveError, ArchiveResult};
pub use fs::{DirEntryInfo, Filesystem, LocalFs};
pub use tree::{ArchiveDir, ArchiveTree};
