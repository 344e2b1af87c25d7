//! The write-once snapshot record.

use serde::{Deserialize, Serialize};

use crate::id::Id;
use crate::types::Timestamp;

/// Metadata for one completed snapshot, stored as a standalone object.
///
/// The record names the root tree and preserves the original target list
/// exactly as the caller supplied it. Snapshots are write-once: the
/// identifier is the hash of the serialized record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the snapshot was taken.
    pub time: Timestamp,
    /// Parent snapshot consulted for reuse, if one was supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Id>,
    /// Identifier of the root tree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<Id>,
    /// The original (pre-normalization) target list.
    pub paths: Vec<String>,
    /// Host the snapshot was taken on.
    pub hostname: String,
    /// User-supplied tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Exclude patterns that were in effect.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<String>,
}

impl Snapshot {
    /// Create a snapshot record; `tree` and `parent` are filled by the caller.
    pub fn new(paths: Vec<String>, tags: Vec<String>, hostname: String, time: Timestamp) -> Self {
        Self {
            time,
            parent: None,
            tree: None,
            paths,
            hostname,
            tags,
            excludes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_snapshot_has_no_tree() {
        let sn = Snapshot::new(
            vec!["/data".to_string()],
            vec![],
            "host".to_string(),
            Timestamp { secs: 10, nanos: 0 },
        );
        assert!(sn.tree.is_none());
        assert!(sn.parent.is_none());
        assert_eq!(sn.paths, ["/data"]);
    }

    #[test]
    fn serde_roundtrip() {
        let mut sn = Snapshot::new(
            vec!["a".to_string(), "b".to_string()],
            vec!["nightly".to_string()],
            "host".to_string(),
            Timestamp { secs: 7, nanos: 9 },
        );
        sn.tree = Some(Id::hash(b"root"));
        sn.excludes = vec!["*.tmp".to_string()];

        let json = serde_json::to_vec(&sn).unwrap();
        let back: Snapshot = serde_json::from_slice(&json).unwrap();
        assert_eq!(back, sn);
    }

    #[test]
    fn optional_fields_omitted_when_empty() {
        let sn = Snapshot::new(vec![], vec![], "h".to_string(), Timestamp::default());
        let json = serde_json::to_string(&sn).unwrap();
        assert!(!json.contains("parent"));
        assert!(!json.contains("tree"));
        assert!(!json.contains("tags"));
        assert!(!json.contains("excludes"));
    }
}
