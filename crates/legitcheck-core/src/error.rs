//! Error types for LegitCheck Core.

use thiserror::Error;

use crate::document::DocumentStatus;

/// Core errors raised while parsing or validating records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid document identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("invalid content hash: {0}")]
    InvalidHash(String),

    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// Guards of the document status lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RevocationError {
    /// The document was revoked earlier; the request changed nothing.
    #[error("document is already revoked")]
    AlreadyRevoked,

    /// The requested transition does not exist in the lifecycle.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: DocumentStatus,
        to: DocumentStatus,
    },

    #[error("revocation requires an actor id")]
    MissingActor,
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
