//! Error types for the issuance and verification services.

use legitcheck_core::{CoreError, DocumentId, IssuerStatus, RevocationError};
use legitcheck_stamp::StampError;
use legitcheck_store::StoreError;
use thiserror::Error;

/// Errors that can occur during service operations.
///
/// Verification never surfaces these: the resolver turns every failure into a
/// logged `not_found` verdict. They come from issuance, revocation and
/// configuration.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The upload could not be parsed as a PDF.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// The blob store rejected the stamped PDF.
    #[error("upload failed: {0}")]
    UploadFailure(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Rejected status change.
    #[error("revocation rejected: {0}")]
    Revocation(#[from] RevocationError),

    /// Document or issuer not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Only verified issuers may issue documents.
    #[error("issuer {issuer_id} is not verified (status: {status})")]
    IssuerNotVerified {
        issuer_id: String,
        status: IssuerStatus,
    },

    /// Required metadata missing or malformed.
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    /// The generated identifier is already registered.
    #[error("identifier collision: {0}")]
    IdentifierCollision(DocumentId),

    /// QR rendering failed.
    #[error("QR encoding failed: {0}")]
    Qr(String),

    /// A blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<StampError> for ServiceError {
    fn from(e: StampError) -> Self {
        match e {
            StampError::MalformedDocument(msg) => ServiceError::MalformedDocument(msg),
            StampError::Write(msg) => ServiceError::MalformedDocument(msg),
            StampError::Qr(e) => ServiceError::Qr(e.to_string()),
            StampError::Options(msg) => ServiceError::Config(msg),
        }
    }
}

impl From<CoreError> for ServiceError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidMetadata(msg) => ServiceError::InvalidMetadata(msg),
            other => ServiceError::Store(StoreError::InvalidData(other.to_string())),
        }
    }
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
