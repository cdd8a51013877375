//! Issuing and revoking documents.
//!
//! Issuance runs in a fixed order: generate an identifier, derive its
//! verification URL, stamp, hash the stamped bytes, upload, render the display
//! QR code, persist. A failure at any step leaves no record behind; a blob that
//! was already uploaded is deleted again on a best-effort basis.

use std::sync::Arc;

use bytes::Bytes;
use legitcheck_core::identifier::random_suffix;
use legitcheck_core::{
    derive_verification_url, digest, now_millis, validate_metadata, ContentHash, Document,
    DocumentId, DocumentMetadata, DocumentStatus, IdGenerator, Issuer, IssuerKind, IssuerStatus,
    RandomIdGenerator, Revocation, RevocationError,
};
use legitcheck_stamp::{svg_data_url, Stamper};
use legitcheck_store::{BlobStore, DocumentStore, InsertResult, RevokeOutcome, StoreError};
use serde::{Deserialize, Serialize};

use crate::blocking;
use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Document counts for one issuer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerStats {
    pub total: usize,
    pub active: usize,
    pub revoked: usize,
}

/// Result of re-hashing a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobAudit {
    pub document_id: DocumentId,
    pub document_url: String,
    /// The hash on the record.
    pub expected: ContentHash,
    /// The hash of the bytes currently stored, if the blob still exists.
    pub actual: Option<ContentHash>,
}

impl BlobAudit {
    /// Whether the stored blob still hashes to the recorded value.
    pub fn is_intact(&self) -> bool {
        self.actual == Some(self.expected)
    }
}

/// Issues, revokes and lists documents.
pub struct IssuanceService<S: DocumentStore, B: BlobStore> {
    store: Arc<S>,
    blobs: Arc<B>,
    ids: Arc<dyn IdGenerator>,
    stamper: Stamper,
    config: ServiceConfig,
}

impl<S: DocumentStore, B: BlobStore> IssuanceService<S, B> {
    /// Create a service with random identifiers.
    pub fn new(store: Arc<S>, blobs: Arc<B>, config: ServiceConfig) -> Self {
        let stamper = Stamper::new(config.layout.clone(), config.stamp_qr.clone());
        Self {
            store,
            blobs,
            ids: Arc::new(RandomIdGenerator),
            stamper,
            config,
        }
    }

    /// Replace the identifier source.
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Issuers
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a new issuer, pending approval.
    pub async fn register_issuer(
        &self,
        user_id: &str,
        organization_name: &str,
        kind: IssuerKind,
        description: &str,
    ) -> Result<Issuer> {
        let now = now_millis();
        let issuer = Issuer {
            id: format!("issuer_{}_{}", now, random_suffix(6)),
            user_id: user_id.trim().to_string(),
            organization_name: organization_name.trim().to_string(),
            kind,
            description: description.trim().to_string(),
            status: IssuerStatus::Pending,
            created_at: now,
            approved_at: None,
            approved_by: None,
        };
        self.store.put_issuer(&issuer).await?;

        tracing::info!(issuer_id = %issuer.id, kind = issuer.kind.as_str(), "registered issuer");
        Ok(issuer)
    }

    /// Mark an issuer as verified.
    pub async fn approve_issuer(&self, issuer_id: &str, reviewer: &str) -> Result<Issuer> {
        self.review_issuer(issuer_id, reviewer, IssuerStatus::Verified)
            .await
    }

    /// Mark an issuer as rejected.
    pub async fn reject_issuer(&self, issuer_id: &str, reviewer: &str) -> Result<Issuer> {
        self.review_issuer(issuer_id, reviewer, IssuerStatus::Rejected)
            .await
    }

    async fn review_issuer(
        &self,
        issuer_id: &str,
        reviewer: &str,
        decision: IssuerStatus,
    ) -> Result<Issuer> {
        let mut issuer = self
            .store
            .get_issuer(issuer_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("issuer {}", issuer_id)))?;

        issuer.status = decision;
        issuer.approved_at = Some(now_millis());
        issuer.approved_by = Some(reviewer.to_string());
        self.store.put_issuer(&issuer).await?;

        tracing::info!(issuer_id, status = %decision, reviewer, "reviewed issuer");
        Ok(issuer)
    }

    /// Get an issuer by id.
    pub async fn issuer(&self, issuer_id: &str) -> Result<Issuer> {
        self.store
            .get_issuer(issuer_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("issuer {}", issuer_id)))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Issuance
    // ─────────────────────────────────────────────────────────────────────────

    /// Stamp `upload`, store it and register the new document.
    pub async fn issue(
        &self,
        issuer: &Issuer,
        upload: Bytes,
        metadata: DocumentMetadata,
    ) -> Result<Document> {
        if self.config.require_verified_issuer && !issuer.is_verified() {
            return Err(ServiceError::IssuerNotVerified {
                issuer_id: issuer.id.clone(),
                status: issuer.status,
            });
        }
        validate_metadata(&metadata)?;

        // 1. Identifier
        let id = self.ids.generate();
        if self.store.get_document(&id).await?.is_some() {
            return Err(ServiceError::IdentifierCollision(id));
        }

        // 2. Verification URL
        let verification_url = derive_verification_url(&id, &self.config.origin);

        // 3-4. Stamp and hash
        let stamper = self.stamper.clone();
        let url = verification_url.clone();
        let (stamped, hash) = blocking::run(move || {
            let stamped = stamper.stamp(&upload, &url)?;
            let hash = digest(&stamped);
            Ok::<_, ServiceError>((Bytes::from(stamped), hash))
        })
        .await??;

        // 5. Upload
        let path = self.blob_path(issuer, &id, &metadata.title);
        let size = stamped.len();
        // Blob puts are create-if-absent, so an occupied path means another
        // issuance holds this id.
        let document_url = match self.blobs.put(&path, stamped, PDF_CONTENT_TYPE).await {
            Ok(url) => url,
            Err(StoreError::BlobExists(_)) => return Err(ServiceError::IdentifierCollision(id)),
            Err(e) => return Err(ServiceError::UploadFailure(e.to_string())),
        };

        // 6. Display QR
        let qr_code_data = match svg_data_url(&verification_url, &self.config.display_qr) {
            Ok(data) => data,
            Err(e) => {
                self.discard_blob(&id, &document_url).await;
                return Err(e.into());
            }
        };

        // 7. Persist
        let doc = Document {
            id,
            issuer_id: issuer.id.clone(),
            issuer_name: issuer.organization_name.clone(),
            title: metadata.title,
            description: metadata.description,
            document_type: metadata.document_type,
            recipient_name: metadata.recipient_name,
            recipient_email: metadata.recipient_email.trim().to_string(),
            hash,
            status: DocumentStatus::Active,
            issued_at: now_millis(),
            revocation: None,
            verification_url,
            qr_code_data,
            document_url,
            original_file_name: metadata.original_file_name,
        };

        match self.store.insert_document(&doc).await {
            Ok(InsertResult::Inserted) => {
                tracing::info!(
                    document_id = %doc.id,
                    issuer_id = %doc.issuer_id,
                    hash = %doc.hash,
                    size,
                    "issued document"
                );
                Ok(doc)
            }
            Ok(InsertResult::AlreadyExists) => {
                // The put above created this blob, so it is ours to remove.
                self.discard_blob(&doc.id, &doc.document_url).await;
                Err(ServiceError::IdentifierCollision(doc.id))
            }
            Err(e) => {
                self.discard_blob(&doc.id, &doc.document_url).await;
                Err(e.into())
            }
        }
    }

    /// Where the stamped PDF for `id` is stored.
    ///
    /// `{prefix}/{userId}/{id}_{title}.pdf`, with every non-alphanumeric
    /// character of the title replaced by `_`.
    pub fn blob_path(&self, issuer: &Issuer, id: &DocumentId, title: &str) -> String {
        let title: String = title
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!(
            "{}/{}/{}_{}.pdf",
            self.config.blob_prefix, issuer.user_id, id, title
        )
    }

    async fn discard_blob(&self, id: &DocumentId, url: &str) {
        match self.blobs.delete(url).await {
            Ok(()) => tracing::debug!(document_id = %id, url, "discarded uploaded blob"),
            Err(e) => tracing::error!(document_id = %id, url, error = %e, "failed to discard uploaded blob"),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Revocation
    // ─────────────────────────────────────────────────────────────────────────

    /// Revoke an active document.
    ///
    /// Revoking an already-revoked document fails with
    /// [`RevocationError::AlreadyRevoked`] and leaves the record untouched.
    pub async fn revoke(
        &self,
        id: &DocumentId,
        actor_id: &str,
        reason: Option<&str>,
    ) -> Result<Document> {
        let revocation = Revocation::new(actor_id, reason, now_millis())?;

        match self.store.revoke_document(id, &revocation).await? {
            RevokeOutcome::Revoked(doc) => {
                tracing::info!(document_id = %id, revoked_by = actor_id, "revoked document");
                Ok(doc)
            }
            RevokeOutcome::AlreadyRevoked(_) => {
                tracing::debug!(document_id = %id, "document already revoked");
                Err(RevocationError::AlreadyRevoked.into())
            }
            RevokeOutcome::NotFound => Err(ServiceError::NotFound(format!("document {}", id))),
        }
    }

    /// Move a document to `to`, subject to the status state machine.
    pub async fn change_status(
        &self,
        id: &DocumentId,
        to: DocumentStatus,
        actor_id: &str,
        reason: Option<&str>,
    ) -> Result<Document> {
        let doc = self.document(id).await?;
        // The only legal transition is active -> revoked.
        doc.status.transition(to)?;
        self.revoke(id, actor_id, reason).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a document by id.
    pub async fn document(&self, id: &DocumentId) -> Result<Document> {
        self.store
            .get_document(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("document {}", id)))
    }

    /// Documents issued by `issuer_id`, newest first.
    pub async fn documents_for_issuer(&self, issuer_id: &str) -> Result<Vec<Document>> {
        Ok(self.store.documents_by_issuer(issuer_id).await?)
    }

    pub async fn issuer_stats(&self, issuer_id: &str) -> Result<IssuerStats> {
        let docs = self.store.documents_by_issuer(issuer_id).await?;
        let active = docs.iter().filter(|d| d.is_active()).count();
        Ok(IssuerStats {
            total: docs.len(),
            active,
            revoked: docs.len() - active,
        })
    }

    /// Re-hash the stored blob of a document and compare it to the record.
    pub async fn audit_blob(&self, id: &DocumentId) -> Result<BlobAudit> {
        let doc = self.document(id).await?;
        let actual = match self.blobs.get(&doc.document_url).await? {
            Some(bytes) => Some(blocking::digest_bytes(bytes).await?),
            None => None,
        };

        let audit = BlobAudit {
            document_id: doc.id,
            document_url: doc.document_url,
            expected: doc.hash,
            actual,
        };
        if audit.is_intact() {
            tracing::debug!(document_id = %audit.document_id, "blob intact");
        } else {
            tracing::warn!(
                document_id = %audit.document_id,
                missing = audit.actual.is_none(),
                "stored blob does not match recorded hash"
            );
        }
        Ok(audit)
    }
}
