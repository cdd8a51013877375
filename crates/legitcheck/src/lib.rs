//! # LegitCheck
//!
//! Issue tamper-evident documents and verify them later.
//!
//! ## Overview
//!
//! - **Issuance**: a verified issuer uploads a PDF; it is stamped with a QR
//!   code and link to its verification URL, hashed, stored and registered
//! - **Verification**: an identifier, a scanned QR payload or the file itself
//!   resolves to `valid`, `revoked` or `not_found`, and every attempt is logged
//! - **Revocation**: an issued document can be revoked exactly once
//!
//! ## Key Concepts
//!
//! - **Identifier**: `doc_<millis>_<suffix>`, embedded in the verification URL
//! - **Hash**: SHA-256 of the stamped bytes; the fallback when a file carries
//!   no identifier
//! - **Verification log**: append-only, one entry per resolution
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use legitcheck::{IssuanceService, RequestContext, ServiceConfig, VerificationRequest, VerificationResolver};
//! use legitcheck::store::{FsBlobStore, SqliteStore};
//!
//! async fn example(issuer: legitcheck::core::Issuer, pdf: bytes::Bytes, meta: legitcheck::core::DocumentMetadata) {
//!     let store = Arc::new(SqliteStore::open("registry.db").unwrap());
//!     let blobs = Arc::new(FsBlobStore::open_file_urls("blobs").unwrap());
//!     let config = ServiceConfig::with_origin("https://legitcheck.example");
//!
//!     let issuance = IssuanceService::new(store.clone(), blobs, config);
//!     let doc = issuance.issue(&issuer, pdf, meta).await.unwrap();
//!
//!     let resolver = VerificationResolver::new(store);
//!     let res = resolver
//!         .resolve(VerificationRequest::Identifier(doc.id.to_string()), &RequestContext::default())
//!         .await;
//!     println!("{}", res.message());
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `legitcheck::core` - Identifiers, hashes, records, revocation
//! - `legitcheck::store` - Registry and blob storage
//! - `legitcheck::stamp` - QR codec, PDF stamper, camera scan loop

mod blocking;
pub mod config;
pub mod error;
pub mod issuance;
pub mod resolver;

#[cfg(test)]
mod test_support;

// Re-export component crates
pub use legitcheck_core as core;
pub use legitcheck_stamp as stamp;
pub use legitcheck_store as store;

pub use config::ServiceConfig;
pub use error::{Result, ServiceError};
pub use issuance::{BlobAudit, IssuanceService, IssuerStats};
pub use resolver::{RequestContext, Resolution, VerificationRequest, VerificationResolver};

pub use legitcheck_core::{
    Document, DocumentId, DocumentMetadata, DocumentStatus, Issuer, IssuerKind, IssuerStatus,
    MatchMethod, Verdict, VerificationLogEntry,
};
