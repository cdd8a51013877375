//! In-memory implementation of the DocumentStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use legitcheck_core::{
    validate_document, validate_issuer, Document, DocumentId, Issuer, Revocation,
    VerificationLogEntry,
};

use crate::error::Result;
use crate::traits::{DocumentPredicate, DocumentStore, InsertResult, RevokeOutcome};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

struct MemoryStoreInner {
    /// Documents indexed by id.
    documents: HashMap<DocumentId, Document>,

    /// Issuers indexed by id.
    issuers: HashMap<String, Issuer>,

    /// Verification log, in append order.
    logs: Vec<VerificationLogEntry>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                documents: HashMap::new(),
                issuers: HashMap::new(),
                logs: Vec::new(),
            }),
        }
    }

    /// Number of stored documents.
    pub fn document_count(&self) -> usize {
        self.inner.read().unwrap().documents.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_document(&self, doc: &Document) -> Result<InsertResult> {
        validate_document(doc)?;

        let mut inner = self.inner.write().unwrap();
        if inner.documents.contains_key(&doc.id) {
            return Ok(InsertResult::AlreadyExists);
        }
        inner.documents.insert(doc.id.clone(), doc.clone());

        Ok(InsertResult::Inserted)
    }

    async fn get_document(&self, id: &DocumentId) -> Result<Option<Document>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.documents.get(id).cloned())
    }

    async fn revoke_document(
        &self,
        id: &DocumentId,
        revocation: &Revocation,
    ) -> Result<RevokeOutcome> {
        // Check and update under one write lock.
        let mut inner = self.inner.write().unwrap();
        let Some(doc) = inner.documents.get_mut(id) else {
            return Ok(RevokeOutcome::NotFound);
        };

        match doc.revoke(revocation.clone()) {
            Ok(()) => Ok(RevokeOutcome::Revoked(doc.clone())),
            Err(_) => Ok(RevokeOutcome::AlreadyRevoked(doc.clone())),
        }
    }

    async fn scan_documents(&self, predicate: DocumentPredicate<'_>) -> Result<Vec<Document>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .documents
            .values()
            .filter(|doc| predicate(doc))
            .cloned()
            .collect())
    }

    async fn put_issuer(&self, issuer: &Issuer) -> Result<()> {
        validate_issuer(issuer)?;

        let mut inner = self.inner.write().unwrap();
        inner.issuers.insert(issuer.id.clone(), issuer.clone());
        Ok(())
    }

    async fn get_issuer(&self, id: &str) -> Result<Option<Issuer>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.issuers.get(id).cloned())
    }

    async fn append_log(&self, entry: &VerificationLogEntry) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.logs.push(entry.clone());
        Ok(())
    }

    async fn recent_logs(&self, limit: usize) -> Result<Vec<VerificationLogEntry>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.logs.iter().rev().take(limit).cloned().collect())
    }

    async fn log_count(&self) -> Result<u64> {
        let inner = self.inner.read().unwrap();
        Ok(inner.logs.len() as u64)
    }
}
