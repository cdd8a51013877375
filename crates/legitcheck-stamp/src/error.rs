//! Error types for stamping and scanning.

use thiserror::Error;

/// Errors raised while rendering a QR code or stamping a PDF.
#[derive(Debug, Error)]
pub enum StampError {
    /// The input is not a PDF we can load, or it has no pages.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// The payload does not fit in a QR code.
    #[error("QR encoding failed: {0}")]
    Qr(#[from] qrcode::types::QrError),

    /// Rendering options are out of range.
    #[error("invalid QR options: {0}")]
    Options(String),

    /// Serializing the stamped PDF failed.
    #[error("failed to write stamped document: {0}")]
    Write(String),
}

/// Errors reported by a frame source during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("camera permission denied")]
    PermissionDenied,

    #[error("frame capture failed: {0}")]
    Frame(String),
}

/// Result type for stamping operations.
pub type Result<T> = std::result::Result<T, StampError>;
