//! Store traits: the abstract interfaces for registry and blob persistence.
//!
//! Services only ever see these traits. Implementations include SQLite
//! (primary) and in-memory (for tests) for documents, and the filesystem and
//! memory for blobs.

use async_trait::async_trait;
use bytes::Bytes;
use legitcheck_core::{ContentHash, Document, DocumentId, Issuer, Revocation, VerificationLogEntry};

use crate::error::Result;

/// Result of inserting a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertResult {
    /// The document was inserted.
    Inserted,
    /// A document with the same id already exists. Nothing was written.
    AlreadyExists,
}

/// Result of a revocation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// The document moved to `revoked`; this is the updated record.
    Revoked(Document),
    /// The document was already revoked; this is the unchanged record.
    AlreadyRevoked(Document),
    /// No document has this id.
    NotFound,
}

/// Predicate applied by a full registry scan.
pub type DocumentPredicate<'a> = &'a (dyn Fn(&Document) -> bool + Send + Sync);

/// The registry: documents, issuers and the verification log.
///
/// The three collections are independent. The store offers atomic
/// single-record create and update; there are no multi-record transactions.
///
/// # Design Notes
///
/// - **Create-if-absent**: `insert_document` never overwrites. A second insert
///   with the same id reports `AlreadyExists`.
/// - **Atomic revocation**: `revoke_document` applies the `active -> revoked`
///   transition as one compare-and-set, so two concurrent revocations cannot
///   both win.
/// - **Hash lookup**: the default `find_documents_by_hash` is a full scan.
///   Backends may override it with an index.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Documents
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert a document unless one with the same id exists.
    async fn insert_document(&self, doc: &Document) -> Result<InsertResult>;

    /// Get a document by id.
    async fn get_document(&self, id: &DocumentId) -> Result<Option<Document>>;

    /// Revoke a document if it is still active.
    async fn revoke_document(
        &self,
        id: &DocumentId,
        revocation: &Revocation,
    ) -> Result<RevokeOutcome>;

    /// Every document matching `predicate`, in no particular order.
    async fn scan_documents(&self, predicate: DocumentPredicate<'_>) -> Result<Vec<Document>>;

    /// Every document whose hash equals `hash`.
    async fn find_documents_by_hash(&self, hash: &ContentHash) -> Result<Vec<Document>> {
        let hash = *hash;
        self.scan_documents(&move |doc: &Document| doc.hash == hash)
            .await
    }

    /// Documents issued by `issuer_id`, newest first.
    async fn documents_by_issuer(&self, issuer_id: &str) -> Result<Vec<Document>> {
        let issuer_id = issuer_id.to_string();
        let mut docs = self
            .scan_documents(&move |doc: &Document| doc.issuer_id == issuer_id)
            .await?;
        docs.sort_by(|a, b| b.issued_at.cmp(&a.issued_at).then_with(|| b.id.cmp(&a.id)));
        Ok(docs)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Issuers
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert or replace an issuer record.
    async fn put_issuer(&self, issuer: &Issuer) -> Result<()>;

    /// Get an issuer by id.
    async fn get_issuer(&self, id: &str) -> Result<Option<Issuer>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Verification log
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a log entry. Entries are never updated or removed.
    async fn append_log(&self, entry: &VerificationLogEntry) -> Result<()>;

    /// The most recent `limit` entries, newest first.
    async fn recent_logs(&self, limit: usize) -> Result<Vec<VerificationLogEntry>>;

    /// Total number of log entries.
    async fn log_count(&self) -> Result<u64>;
}

/// Object storage for stamped PDFs.
///
/// `put` returns a URL that `get` and `delete` accept. The URL scheme is the
/// backend's business.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` at `path`, returning a retrievable URL.
    ///
    /// Create-if-absent: an occupied path fails with
    /// [`StoreError::BlobExists`](crate::StoreError::BlobExists) and the
    /// existing blob is left alone.
    async fn put(&self, path: &str, bytes: Bytes, content_type: &str) -> Result<String>;

    /// Fetch the bytes behind `url`.
    async fn get(&self, url: &str) -> Result<Option<Bytes>>;

    /// Remove the blob behind `url`. Removing a missing blob is not an error.
    async fn delete(&self, url: &str) -> Result<()>;
}
