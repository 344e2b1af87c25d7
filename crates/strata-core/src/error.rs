//! Error types for the strata data model and repository contract.

use thiserror::Error;

use crate::id::Id;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Error variants for data-model and repository operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An identifier could not be parsed from its hex form.
    #[error("invalid hex identifier: {reason}")]
    InvalidHex {
        /// Why the string was rejected.
        reason: String,
    },

    /// A tree already contains a node with this name.
    #[error("tree already contains a node named {name:?}")]
    DuplicateName {
        /// The conflicting leaf name.
        name: String,
    },

    /// The repository has no object with this identifier.
    #[error("object {id} not found in repository")]
    NotFound {
        /// The identifier that was looked up.
        id: Id,
    },

    /// A persisted object could not be encoded or decoded.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Wraps standard I/O errors from repository backends.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
