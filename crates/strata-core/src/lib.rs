#![warn(missing_docs)]

//! Content-addressed data model for strata snapshots.
//!
//! Everything a snapshot persists is named by the BLAKE3 hash of its bytes:
//! file chunks become [`BlobKind::Data`] blobs, directory listings become
//! [`Tree`] objects, and a completed run is recorded as a standalone
//! [`Snapshot`]. The [`Repository`] trait is the storage contract the
//! archiver drives; [`MemoryRepository`] is a complete in-memory
//! implementation used throughout the test suites.

pub mod error;
pub mod id;
pub mod memory;
pub mod node;
pub mod repo;
pub mod snapshot;
pub mod tree;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use id::Id;
pub use memory::MemoryRepository;
pub use node::{Node, NodeKind};
pub use repo::{ChunkerParams, RepoConfig, Repository};
pub use snapshot::Snapshot;
pub use tree::Tree;
pub use types::{BlobKind, Timestamp};
