//! Resolving verification requests to verdicts.
//!
//! Three kinds of input reach the resolver: an identifier typed by a person,
//! a payload decoded from a QR code, and the bytes of an uploaded file. Each
//! resolves to `valid`, `revoked` or `not_found`, and every call appends
//! exactly one entry to the verification log. Resolution never fails: store
//! errors are logged and read as "nothing found".

use std::sync::Arc;

use bytes::Bytes;
use legitcheck_core::{
    now_millis, token_from_bytes, token_from_payload, ContentHash, Document, DocumentId,
    LogResult, MatchMethod, Verdict, VerificationLogEntry,
};
use legitcheck_store::DocumentStore;
use serde::{Deserialize, Serialize};

use crate::blocking;
use crate::error::Result;

/// What the verifier handed us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationRequest {
    /// An identifier entered by hand.
    Identifier(String),
    /// A decoded QR payload: a verification URL or a bare identifier.
    ScannedPayload(String),
    /// The bytes of an uploaded file.
    Upload(Bytes),
}

/// Who is asking. Copied into the log entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// The outcome of one verification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub verdict: Verdict,
    pub document: Option<Document>,
    pub matched_by: Option<MatchMethod>,
    /// The value recorded as `documentId` in the log entry.
    pub attempted: String,
    /// How many documents shared the uploaded file's hash. Zero unless the
    /// hash path ran.
    pub candidates: usize,
}

impl Resolution {
    /// User-facing message for the verdict.
    pub fn message(&self) -> &'static str {
        self.verdict.message()
    }

    fn found(doc: Document, method: MatchMethod, attempted: String) -> Self {
        Self {
            verdict: Verdict::for_status(doc.status),
            document: Some(doc),
            matched_by: Some(method),
            attempted,
            candidates: 0,
        }
    }

    fn not_found(attempted: String) -> Self {
        Self {
            verdict: Verdict::NotFound,
            document: None,
            matched_by: None,
            attempted,
            candidates: 0,
        }
    }
}

/// Resolves verification requests against the registry.
pub struct VerificationResolver<S: DocumentStore> {
    store: Arc<S>,
}

impl<S: DocumentStore> VerificationResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Resolve `request`, logging the attempt.
    pub async fn resolve(
        &self,
        request: VerificationRequest,
        context: &RequestContext,
    ) -> Resolution {
        let resolution = match request {
            VerificationRequest::Identifier(raw) => self.resolve_identifier(raw.trim()).await,
            VerificationRequest::ScannedPayload(payload) => {
                match token_from_payload(&payload) {
                    Some(token) => {
                        self.lookup(token.id, MatchMethod::EmbeddedIdentifier)
                            .await
                    }
                    None => Resolution::not_found(payload.trim().to_string()),
                }
            }
            VerificationRequest::Upload(bytes) => self.resolve_upload(bytes).await,
        };

        self.record(&resolution, context).await;

        tracing::info!(
            verdict = %resolution.verdict,
            attempted = %resolution.attempted,
            matched_by = ?resolution.matched_by,
            "resolved verification request"
        );
        resolution
    }

    /// Resolve a hand-entered identifier. Malformed input cannot match
    /// anything, but is still logged as attempted.
    async fn resolve_identifier(&self, raw: &str) -> Resolution {
        match DocumentId::parse(raw) {
            Ok(id) => self.lookup(id, MatchMethod::Identifier).await,
            Err(_) => Resolution::not_found(raw.to_string()),
        }
    }

    async fn lookup(&self, id: DocumentId, method: MatchMethod) -> Resolution {
        let attempted = id.to_string();
        match self.fetch(&id).await {
            Some(doc) => Resolution::found(doc, method, attempted),
            None => Resolution::not_found(attempted),
        }
    }

    async fn fetch(&self, id: &DocumentId) -> Option<Document> {
        match self.store.get_document(id).await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(document_id = %id, error = %e, "document lookup failed");
                None
            }
        }
    }

    /// Embedded identifier first, content hash second.
    async fn resolve_upload(&self, bytes: Bytes) -> Resolution {
        let token = token_from_bytes(&bytes);
        if let Some(token) = &token {
            if let Some(doc) = self.fetch(&token.id).await {
                return Resolution::found(
                    doc,
                    MatchMethod::EmbeddedIdentifier,
                    token.id.to_string(),
                );
            }
            tracing::debug!(document_id = %token.id, "embedded identifier not registered");
        }

        let hash = match blocking::digest_bytes(bytes).await {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(error = %e, "hashing upload failed");
                let attempted = token.map(|t| t.id.to_string()).unwrap_or_default();
                return Resolution::not_found(attempted);
            }
        };

        let mut candidates = self.by_hash(&hash).await;
        let count = candidates.len();
        // Earliest issuance wins; ties go to the smaller id.
        candidates.sort_by(|a, b| a.issued_at.cmp(&b.issued_at).then_with(|| a.id.cmp(&b.id)));

        if count > 1 {
            tracing::warn!(
                hash = %hash,
                candidates = count,
                chosen = %candidates[0].id,
                "several documents share one content hash"
            );
        }

        let mut resolution = match candidates.into_iter().next() {
            Some(doc) => {
                let attempted = match &token {
                    Some(t) => t.id.to_string(),
                    None => doc.id.to_string(),
                };
                Resolution::found(doc, MatchMethod::ContentHash, attempted)
            }
            None => Resolution::not_found(match token {
                Some(t) => t.id.to_string(),
                None => VerificationLogEntry::hash_placeholder(&hash),
            }),
        };
        resolution.candidates = count;
        resolution
    }

    async fn by_hash(&self, hash: &ContentHash) -> Vec<Document> {
        match self.store.find_documents_by_hash(hash).await {
            Ok(docs) => docs,
            Err(e) => {
                tracing::warn!(hash = %hash, error = %e, "hash lookup failed");
                Vec::new()
            }
        }
    }

    async fn record(&self, resolution: &Resolution, context: &RequestContext) {
        let entry = VerificationLogEntry::new(
            resolution.attempted.clone(),
            LogResult::from(resolution.verdict),
            now_millis(),
        )
        .with_client(context.ip_address.clone(), context.user_agent.clone());

        if let Err(e) = self.store.append_log(&entry).await {
            tracing::warn!(log_id = %entry.id, error = %e, "failed to append verification log");
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Log queries
    // ─────────────────────────────────────────────────────────────────────────

    /// The most recent `limit` log entries, newest first.
    pub async fn recent_logs(&self, limit: usize) -> Result<Vec<VerificationLogEntry>> {
        Ok(self.store.recent_logs(limit).await?)
    }

    pub async fn log_count(&self) -> Result<u64> {
        Ok(self.store.log_count().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::issuance::IssuanceService;
    use crate::test_support::{metadata, sample_pdf, verified_issuer, FixedIds};
    use legitcheck_core::{digest, DocumentStatus};
    use legitcheck_store::{BlobStore, MemoryBlobStore, MemoryStore};

    struct Harness {
        store: Arc<MemoryStore>,
        blobs: Arc<MemoryBlobStore>,
        issuance: IssuanceService<MemoryStore, MemoryBlobStore>,
        resolver: VerificationResolver<MemoryStore>,
    }

    fn harness(ids: &[&str]) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let issuance = IssuanceService::new(
            store.clone(),
            blobs.clone(),
            ServiceConfig::with_origin("https://legitcheck.example"),
        )
        .with_id_generator(Arc::new(FixedIds::new(ids)));
        let resolver = VerificationResolver::new(store.clone());
        Harness {
            store,
            blobs,
            issuance,
            resolver,
        }
    }

    async fn issue(h: &Harness, title: &str) -> Document {
        h.issuance
            .issue(&verified_issuer(), sample_pdf(title), metadata(title))
            .await
            .unwrap()
    }

    fn ctx() -> RequestContext {
        RequestContext::default()
    }

    #[tokio::test]
    async fn test_identifier_valid_then_revoked() {
        let h = harness(&["doc_1700000000000_abc123xyz"]);
        let doc = issue(&h, "Diploma").await;

        let res = h
            .resolver
            .resolve(VerificationRequest::Identifier(doc.id.to_string()), &ctx())
            .await;
        assert_eq!(res.verdict, Verdict::Valid);
        assert_eq!(res.matched_by, Some(MatchMethod::Identifier));
        assert_eq!(res.message(), "Document is valid and authentic");

        h.issuance
            .revoke(&doc.id, "issuer_1", Some("error"))
            .await
            .unwrap();
        let res = h
            .resolver
            .resolve(
                VerificationRequest::Identifier("  doc_1700000000000_abc123xyz ".into()),
                &ctx(),
            )
            .await;
        assert_eq!(res.verdict, Verdict::Revoked);
        let found = res.document.unwrap();
        assert_eq!(found.status, DocumentStatus::Revoked);
        assert_eq!(found.revoked_by(), Some("issuer_1"));

        let logs = h.resolver.recent_logs(10).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].result, LogResult::Revoked);
        assert_eq!(logs[1].result, LogResult::Valid);
        assert!(logs.iter().all(|l| l.document_id == "doc_1700000000000_abc123xyz"));
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_identifiers() {
        let h = harness(&[]);

        for raw in ["doc_1_neverissued", "not an id at all"] {
            let res = h
                .resolver
                .resolve(VerificationRequest::Identifier(raw.into()), &ctx())
                .await;
            assert_eq!(res.verdict, Verdict::NotFound);
            assert_eq!(res.attempted, raw);
            assert_eq!(res.message(), "Document not found in our database");
        }

        let logs = h.resolver.recent_logs(10).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|l| l.result == LogResult::Invalid));
        assert_eq!(logs[0].document_id, "not an id at all");
    }

    #[tokio::test]
    async fn test_scanned_payload() {
        let h = harness(&["doc_1700000000000_abc123xyz"]);
        let doc = issue(&h, "Diploma").await;

        let res = h
            .resolver
            .resolve(
                VerificationRequest::ScannedPayload(doc.verification_url.clone()),
                &ctx(),
            )
            .await;
        assert_eq!(res.verdict, Verdict::Valid);
        assert_eq!(res.matched_by, Some(MatchMethod::EmbeddedIdentifier));

        let res = h
            .resolver
            .resolve(
                VerificationRequest::ScannedPayload("WIFI:S:cafe;;".into()),
                &ctx(),
            )
            .await;
        assert_eq!(res.verdict, Verdict::NotFound);
        assert_eq!(res.attempted, "WIFI:S:cafe;;");
    }

    #[tokio::test]
    async fn test_upload_uses_embedded_identifier() {
        let h = harness(&["doc_1700000000000_abc123xyz"]);
        let doc = issue(&h, "Diploma").await;

        let stamped = h.blobs.get(&doc.document_url).await.unwrap().unwrap();
        let res = h
            .resolver
            .resolve(VerificationRequest::Upload(stamped), &ctx())
            .await;
        assert_eq!(res.verdict, Verdict::Valid);
        assert_eq!(res.matched_by, Some(MatchMethod::EmbeddedIdentifier));
        assert_eq!(res.document.unwrap().id, doc.id);
    }

    #[tokio::test]
    async fn test_upload_falls_back_to_hash() {
        let h = harness(&["doc_1700000000000_abc123xyz"]);
        let doc = issue(&h, "Diploma").await;

        // Same hash, no extractable identifier: rewrite the record so its
        // hash points at bytes without a stamp.
        let bare = sample_pdf("unstamped");
        let mut twin = doc.clone();
        twin.id = DocumentId::parse("doc_1700000000001_twin00000").unwrap();
        twin.verification_url = legitcheck_core::derive_verification_url(
            &twin.id,
            "https://legitcheck.example",
        );
        twin.hash = digest(&bare);
        h.store.insert_document(&twin).await.unwrap();

        let res = h
            .resolver
            .resolve(VerificationRequest::Upload(bare.clone()), &ctx())
            .await;
        assert_eq!(res.verdict, Verdict::Valid);
        assert_eq!(res.matched_by, Some(MatchMethod::ContentHash));
        assert_eq!(res.document.as_ref().unwrap().id, twin.id);
        assert_eq!(res.attempted, twin.id.as_str());
        assert_eq!(res.candidates, 1);
    }

    #[tokio::test]
    async fn test_unrelated_upload_logs_hash_placeholder() {
        let h = harness(&["doc_1700000000000_abc123xyz"]);
        issue(&h, "Diploma").await;

        let junk = Bytes::from_static(b"nothing to see here");
        let res = h
            .resolver
            .resolve(VerificationRequest::Upload(junk.clone()), &ctx())
            .await;
        assert_eq!(res.verdict, Verdict::NotFound);
        assert_eq!(res.attempted, format!("sha256:{}", digest(&junk).to_hex()));
        assert_eq!(h.resolver.log_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ambiguous_hash_picks_earliest() {
        let h = harness(&["doc_1700000000000_abc123xyz"]);
        let doc = issue(&h, "Diploma").await;
        let bare = sample_pdf("shared");

        let make = |id: &str, issued_at: i64| {
            let mut d = doc.clone();
            d.id = DocumentId::parse(id).unwrap();
            d.verification_url =
                legitcheck_core::derive_verification_url(&d.id, "https://legitcheck.example");
            d.hash = digest(&bare);
            d.issued_at = issued_at;
            d
        };
        for d in [
            make("doc_3_later", 300),
            make("doc_1_second", 100),
            make("doc_1_first", 100),
        ] {
            h.store.insert_document(&d).await.unwrap();
        }

        let res = h
            .resolver
            .resolve(VerificationRequest::Upload(bare), &ctx())
            .await;
        assert_eq!(res.candidates, 3);
        assert_eq!(res.document.unwrap().id.as_str(), "doc_1_first");
    }

    #[tokio::test]
    async fn test_context_copied_into_log() {
        let h = harness(&[]);
        let context = RequestContext {
            ip_address: Some("203.0.113.7".into()),
            user_agent: Some("Mozilla/5.0".into()),
        };
        h.resolver
            .resolve(VerificationRequest::Identifier("doc_1_x".into()), &context)
            .await;

        let logs = h.resolver.recent_logs(1).await.unwrap();
        assert_eq!(logs[0].ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(logs[0].user_agent.as_deref(), Some("Mozilla/5.0"));
        assert!(logs[0].id.starts_with("log_"));
    }

    #[tokio::test]
    async fn test_one_log_entry_per_call() {
        let h = harness(&["doc_1700000000000_abc123xyz"]);
        let doc = issue(&h, "Diploma").await;
        let stamped = h.blobs.get(&doc.document_url).await.unwrap().unwrap();

        let requests = vec![
            VerificationRequest::Identifier(doc.id.to_string()),
            VerificationRequest::Identifier("garbage".into()),
            VerificationRequest::ScannedPayload(doc.verification_url.clone()),
            VerificationRequest::Upload(stamped),
            VerificationRequest::Upload(Bytes::from_static(b"junk")),
        ];
        for (i, request) in requests.into_iter().enumerate() {
            let before = h.resolver.log_count().await.unwrap();
            h.resolver.resolve(request, &ctx()).await;
            assert_eq!(h.resolver.log_count().await.unwrap(), before + 1, "request {i}");
        }
    }
}
