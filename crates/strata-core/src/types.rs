//! Small shared types: blob kinds and timestamps.

use serde::{Deserialize, Serialize};

/// The kind of a stored blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlobKind {
    /// A content-defined chunk of a file body.
    Data,
    /// A serialized directory listing.
    Tree,
}

/// Represents a point in time with second and nanosecond precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
    /// Seconds since Unix epoch.
    pub secs: u64,
    /// Nanoseconds within the second.
    pub nanos: u32,
}

impl Timestamp {
    /// Returns the current timestamp.
    pub fn now() -> Self {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time before epoch");
        Self {
            secs: now.as_secs(),
            nanos: now.subsec_nanos(),
        }
    }

    /// Converts a system time; values before the epoch clamp to zero.
    pub fn from_system(t: std::time::SystemTime) -> Self {
        match t.duration_since(std::time::UNIX_EPOCH) {
            Ok(d) => Self {
                secs: d.as_secs(),
                nanos: d.subsec_nanos(),
            },
            Err(_) => Self::default(),
        }
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.secs
            .cmp(&other.secs)
            .then_with(|| self.nanos.cmp(&other.nanos))
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn ordering_by_secs_then_nanos() {
        let a = Timestamp { secs: 1, nanos: 5 };
        let b = Timestamp { secs: 1, nanos: 9 };
        let c = Timestamp { secs: 2, nanos: 0 };
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn from_system_roundtrip() {
        let t = UNIX_EPOCH + Duration::new(1_000, 42);
        let ts = Timestamp::from_system(t);
        assert_eq!(ts, Timestamp { secs: 1_000, nanos: 42 });
    }

    #[test]
    fn pre_epoch_clamps_to_zero() {
        let t = UNIX_EPOCH - Duration::from_secs(10);
        assert_eq!(Timestamp::from_system(t), Timestamp::default());
    }

    #[test]
    fn now_is_after_epoch() {
        assert!(Timestamp::now() > Timestamp::default());
    }
}
