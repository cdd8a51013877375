//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored column could not be turned back into a record.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record or blob not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A record failed validation at the store boundary.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A blob already exists at the target path.
    #[error("blob already exists: {0}")]
    BlobExists(String),

    /// The blob store refused a write.
    #[error("blob rejected: {0}")]
    BlobRejected(String),

    /// A blocking task failed to complete.
    #[error("background task failed: {0}")]
    Task(String),
}

impl From<legitcheck_core::CoreError> for StoreError {
    fn from(e: legitcheck_core::CoreError) -> Self {
        StoreError::InvalidData(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
