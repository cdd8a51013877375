//! # LegitCheck Core
//!
//! Pure primitives for LegitCheck: document identifiers, content hashes,
//! registry records, and the revocation state machine.
//!
//! This crate contains no I/O, no storage, no PDF handling. It is the part of
//! the issuance/verification protocol that can be reasoned about without any
//! collaborator.
//!
//! ## Key Types
//!
//! - [`DocumentId`] - `doc_<unixMillis>_<base36>` identifier, the registry primary key
//! - [`ContentHash`] - SHA-256 digest of the stamped PDF bytes
//! - [`Document`] - The verifiable unit: metadata, hash, status, blob reference
//! - [`VerificationLogEntry`] - One append-only audit record per verification attempt
//!
//! ## Identifier extraction
//!
//! Verifiers hand us scanned QR payloads or whole uploaded files. The
//! [`extract`] module turns either into a candidate [`DocumentId`].

pub mod document;
pub mod error;
pub mod extract;
pub mod hash;
pub mod identifier;
pub mod revocation;
pub mod types;
pub mod validation;
pub mod verification;

pub use document::{
    Document, DocumentMetadata, DocumentStatus, Issuer, IssuerKind, IssuerStatus, Revocation,
};
pub use error::{CoreError, Result, RevocationError};
pub use extract::{token_from_bytes, token_from_payload, EmbeddedToken, TokenSource};
pub use hash::{digest, ContentHash};
pub use identifier::{
    derive_verification_url, is_valid_format, IdGenerator, RandomIdGenerator, VERIFY_PATH,
};
pub use types::{now_millis, DocumentId};
pub use validation::{validate_document, validate_issuer, validate_metadata};
pub use verification::{LogResult, MatchMethod, Verdict, VerificationLogEntry};
