//! In-memory repository implementation.
//!
//! A complete, thread-safe implementation of [`Repository`] backed by maps.
//! Shipped in the crate (not behind `cfg(test)`) so downstream test suites
//! can drive the archiver end to end; the write counters let tests assert
//! deduplication and reuse behavior precisely.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::error::{CoreError, CoreResult};
use crate::id::Id;
use crate::repo::{RepoConfig, Repository};
use crate::snapshot::Snapshot;
use crate::tree::Tree;
use crate::types::BlobKind;

/// In-memory [`Repository`] with flush/pending bookkeeping.
pub struct MemoryRepository {
    config: RepoConfig,
    blobs: Mutex<HashMap<Id, (BlobKind, Vec<u8>)>>,
    pending: Mutex<Vec<Id>>,
    snapshots: Mutex<HashMap<Id, Vec<u8>>>,
    data_blobs_written: AtomicU64,
    tree_blobs_written: AtomicU64,
    flushes: AtomicU64,
    index_saves: AtomicU64,
}

impl MemoryRepository {
    /// Create a repository with default chunker parameters.
    pub fn new() -> Self {
        Self::with_config(RepoConfig::default())
    }

    /// Create a repository with explicit parameters.
    pub fn with_config(config: RepoConfig) -> Self {
        Self {
            config,
            blobs: Mutex::new(HashMap::new()),
            pending: Mutex::new(Vec::new()),
            snapshots: Mutex::new(HashMap::new()),
            data_blobs_written: AtomicU64::new(0),
            tree_blobs_written: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
            index_saves: AtomicU64::new(0),
        }
    }

    /// Number of distinct data blobs ever written.
    pub fn data_blobs_written(&self) -> u64 {
        self.data_blobs_written.load(Ordering::Relaxed)
    }

    /// Number of distinct tree blobs ever written.
    pub fn tree_blobs_written(&self) -> u64 {
        self.tree_blobs_written.load(Ordering::Relaxed)
    }

    /// Number of flush calls observed.
    pub fn flushes(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }

    /// Number of index persists observed.
    pub fn index_saves(&self) -> u64 {
        self.index_saves.load(Ordering::Relaxed)
    }

    /// Number of blobs written since the last flush.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().expect("lock poisoned").len()
    }

    /// Number of persisted snapshot records.
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.lock().expect("lock poisoned").len()
    }

    /// True if a blob with this identifier is stored.
    pub fn contains(&self, id: &Id) -> bool {
        self.blobs.lock().expect("lock poisoned").contains_key(id)
    }

    /// Raw bytes of a stored blob, if present.
    pub fn blob_bytes(&self, id: &Id) -> Option<Vec<u8>> {
        self.blobs
            .lock()
            .expect("lock poisoned")
            .get(id)
            .map(|(_, bytes)| bytes.clone())
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MemoryRepository {
    fn config(&self) -> &RepoConfig {
        &self.config
    }

    fn save_blob(&self, kind: BlobKind, data: &[u8], id: Option<Id>) -> CoreResult<Id> {
        let id = id.unwrap_or_else(|| Id::hash(data));
        let mut blobs = self.blobs.lock().expect("lock poisoned");
        if blobs.contains_key(&id) {
            return Ok(id);
        }
        blobs.insert(id, (kind, data.to_vec()));
        drop(blobs);

        match kind {
            BlobKind::Data => self.data_blobs_written.fetch_add(1, Ordering::Relaxed),
            BlobKind::Tree => self.tree_blobs_written.fetch_add(1, Ordering::Relaxed),
        };
        self.pending.lock().expect("lock poisoned").push(id);
        Ok(id)
    }

    fn load_tree(&self, id: &Id) -> CoreResult<Tree> {
        let blobs = self.blobs.lock().expect("lock poisoned");
        match blobs.get(id) {
            Some((BlobKind::Tree, bytes)) => Tree::from_json(bytes),
            _ => Err(CoreError::NotFound { id: *id }),
        }
    }

    fn save_tree(&self, tree: &Tree) -> CoreResult<Id> {
        let bytes = tree.to_canonical_json()?;
        self.save_blob(BlobKind::Tree, &bytes, None)
    }

    fn flush(&self) -> CoreResult<()> {
        self.pending.lock().expect("lock poisoned").clear();
        self.flushes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn save_index(&self) -> CoreResult<()> {
        self.index_saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn save_snapshot(&self, snapshot: &Snapshot) -> CoreResult<Id> {
        let bytes = serde_json::to_vec(snapshot)?;
        let id = Id::hash(&bytes);
        self.snapshots
            .lock()
            .expect("lock poisoned")
            .insert(id, bytes);
        Ok(id)
    }

    fn load_snapshot(&self, id: &Id) -> CoreResult<Snapshot> {
        let snapshots = self.snapshots.lock().expect("lock poisoned");
        match snapshots.get(id) {
            Some(bytes) => Ok(serde_json::from_slice(bytes)?),
            None => Err(CoreError::NotFound { id: *id }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_blob_is_idempotent() {
        let repo = MemoryRepository::new();
        let a = repo.save_blob(BlobKind::Data, b"chunk", None).unwrap();
        let b = repo.save_blob(BlobKind::Data, b"chunk", None).unwrap();
        assert_eq!(a, b);
        assert_eq!(repo.data_blobs_written(), 1);
    }

    #[test]
    fn save_blob_with_explicit_id() {
        let repo = MemoryRepository::new();
        let id = Id::hash(b"precomputed");
        let stored = repo
            .save_blob(BlobKind::Data, b"precomputed", Some(id))
            .unwrap();
        assert_eq!(stored, id);
        assert!(repo.contains(&id));
    }

    #[test]
    fn tree_roundtrip() {
        let repo = MemoryRepository::new();
        let tree = Tree::new();
        let id = repo.save_tree(&tree).unwrap();
        let loaded = repo.load_tree(&id).unwrap();
        assert_eq!(loaded, tree);
        assert_eq!(repo.tree_blobs_written(), 1);
    }

    #[test]
    fn load_tree_missing_id() {
        let repo = MemoryRepository::new();
        let err = repo.load_tree(&Id::hash(b"missing")).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn load_tree_rejects_data_blob() {
        let repo = MemoryRepository::new();
        let id = repo.save_blob(BlobKind::Data, b"not a tree", None).unwrap();
        assert!(repo.load_tree(&id).is_err());
    }

    #[test]
    fn flush_clears_pending() {
        let repo = MemoryRepository::new();
        repo.save_blob(BlobKind::Data, b"a", None).unwrap();
        repo.save_blob(BlobKind::Data, b"b", None).unwrap();
        assert_eq!(repo.pending_count(), 2);
        repo.flush().unwrap();
        assert_eq!(repo.pending_count(), 0);
        assert_eq!(repo.flushes(), 1);
    }

    #[test]
    fn snapshot_roundtrip() {
        use crate::types::Timestamp;

        let repo = MemoryRepository::new();
        let mut sn = Snapshot::new(
            vec!["/data".to_string()],
            vec![],
            "host".to_string(),
            Timestamp { secs: 3, nanos: 0 },
        );
        sn.tree = Some(Id::hash(b"root"));

        let id = repo.save_snapshot(&sn).unwrap();
        let loaded = repo.load_snapshot(&id).unwrap();
        assert_eq!(loaded, sn);
        assert_eq!(repo.snapshot_count(), 1);
    }

    #[test]
    fn load_snapshot_missing_id() {
        let repo = MemoryRepository::new();
        assert!(repo.load_snapshot(&Id::hash(b"nope")).is_err());
    }
}
