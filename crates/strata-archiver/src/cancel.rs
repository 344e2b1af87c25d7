//! Cooperative cancellation for a snapshot run.
//!
//! The archiver observes cancellation at defined suspension points: around
//! each chunk retrieval and blob save, at entry to each directory
//! enumeration, and before each repository call in the orchestrator. The
//! token is cloneable so callers can hold the handle while the run owns a
//! token copy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Error returned when a run is cancelled.
#[derive(Error, Debug)]
#[error("operation cancelled")]
pub struct CancelledError;

/// A lightweight, cloneable cancellation token.
#[derive(Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Check if this token has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Return an error if cancellation has been triggered.
    pub fn check(&self) -> Result<(), CancelledError> {
        if self.is_cancelled() {
            Err(CancelledError)
        } else {
            Ok(())
        }
    }
}

/// The handle that triggers cancellation.
#[derive(Clone)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Trigger cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation has been triggered.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Create a new cancellation token/handle pair.
pub fn new_cancel_pair() -> (CancelToken, CancelHandle) {
    let cancelled = Arc::new(AtomicBool::new(false));
    let token = CancelToken {
        cancelled: cancelled.clone(),
    };
    let handle = CancelHandle { cancelled };
    (token, handle)
}
