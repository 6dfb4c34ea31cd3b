//! Key-ring error types.

use thiserror::Error;
use uuid::Uuid;

/// Result type for key-ring operations.
pub type KeyRingResult<T> = Result<T, KeyRingError>;

/// Errors that can occur in key lifecycle management.
#[derive(Debug, Error)]
pub enum KeyRingError {
    /// The repository could not be reached and no cached ring exists.
    /// With a cached ring, refresh failures are logged and absorbed instead.
    #[error("key repository unavailable: {0}")]
    RepositoryUnavailable(String),

    /// Conditional insert lost: the key id already exists. During rotation
    /// this means another process created the successor first, which is not
    /// a failure for the caller.
    #[error("key {0} already exists in the repository")]
    Conflict(Uuid),

    #[error("key {0} not found in the repository")]
    NotFound(Uuid),

    /// No default-eligible key exists and auto-generation is disabled.
    #[error("no default-eligible key and auto-generation is disabled")]
    NoEligibleKey,

    #[error("invalid key record {id}: {reason}")]
    InvalidRecord { id: Uuid, reason: String },

    #[error("at-rest protection failed: {0}")]
    AtRest(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
