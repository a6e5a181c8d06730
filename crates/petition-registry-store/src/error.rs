//! Error types for the store module.

use petition_registry_core::StateError;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Tag list serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A stored row does not satisfy the registry schema.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Stored parts do not form a consistent registry.
    #[error("inconsistent state: {0}")]
    State(#[from] StateError),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding the backend was poisoned.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// A blocking task could not be joined.
    #[error("blocking task failed: {0}")]
    Task(String),

    /// The backend refused the write.
    #[error("write rejected: {0}")]
    WriteRejected(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
