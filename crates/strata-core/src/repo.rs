//! The repository contract the archiver drives.

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::id::Id;
use crate::snapshot::Snapshot;
use crate::tree::Tree;
use crate::types::BlobKind;

/// Content-defined chunking parameters, owned by the repository.
///
/// Chunk boundaries are a property of the repository: every archiver run
/// against the same repository must use the same parameters, or identical
/// content would stop deduplicating across snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerParams {
    /// Minimum chunk size in bytes.
    pub min_size: u32,
    /// Average (target) chunk size in bytes.
    pub avg_size: u32,
    /// Maximum chunk size in bytes.
    pub max_size: u32,
}

impl Default for ChunkerParams {
    fn default() -> Self {
        Self {
            min_size: 32 * 1024,
            avg_size: 64 * 1024,
            max_size: 512 * 1024,
        }
    }
}

/// Static repository parameters visible to the archiver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Chunking parameters applied to every file body.
    pub chunker: ChunkerParams,
}

/// Storage contract consumed by the archiver.
///
/// Pack assembly, indexing, and transport are internal to implementations;
/// the archiver only sees content-addressed saves and loads. `save_blob`
/// is idempotent: storing bytes that hash to an existing identifier is a
/// no-op that returns the same id.
pub trait Repository: Send + Sync {
    /// Static parameters, including the chunker configuration.
    fn config(&self) -> &RepoConfig;

    /// Store a blob, returning its content identifier.
    ///
    /// When `id` is `None` the identifier is computed from the bytes.
    fn save_blob(&self, kind: BlobKind, data: &[u8], id: Option<Id>) -> CoreResult<Id>;

    /// Load and decode a tree object.
    fn load_tree(&self, id: &Id) -> CoreResult<Tree>;

    /// Encode and store a tree, returning its identifier.
    fn save_tree(&self, tree: &Tree) -> CoreResult<Id>;

    /// Force buffered blobs to durable storage.
    fn flush(&self) -> CoreResult<()>;

    /// Persist the index over stored blobs.
    fn save_index(&self) -> CoreResult<()>;

    /// Store a snapshot record as a standalone unpacked object.
    fn save_snapshot(&self, snapshot: &Snapshot) -> CoreResult<Id>;

    /// Load a snapshot record.
    fn load_snapshot(&self, id: &Id) -> CoreResult<Snapshot>;
}
