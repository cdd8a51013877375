//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};

use legitcheck::{
    IssuanceService, RequestContext, Resolution, ServiceConfig, VerificationRequest,
    VerificationResolver,
};
use legitcheck_core::identifier::generate;
use legitcheck_core::{
    ContentHash, CoreError, Document, DocumentId, DocumentMetadata, IdGenerator, Issuer,
    IssuerKind, IssuerStatus, RandomIdGenerator, Revocation, VerificationLogEntry,
};
use legitcheck_stamp::{FrameSource, ScanError};
use legitcheck_store::{
    BlobStore, DocumentPredicate, DocumentStore, InsertResult, MemoryBlobStore, MemoryStore,
    RevokeOutcome, StoreError,
};

/// Origin used by [`TestFixture`].
pub const ORIGIN: &str = "https://legitcheck.example";

// ─────────────────────────────────────────────────────────────────────────────
// Sample data
// ─────────────────────────────────────────────────────────────────────────────

/// A PDF with `pages` pages, each showing `text` and its page number.
///
/// Content streams are uncompressed. Page resources are inherited from the
/// page tree, the way many generators lay them out.
pub fn sample_pdf(pages: usize, text: &str) -> Bytes {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Times-Roman",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for i in 0..pages.max(1) {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 18i64.into()]),
                Operation::new("Td", vec![72i64.into(), 700i64.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("{} ({})", text, i + 1))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let bytes = content.encode().unwrap_or_default();
        let content_id = doc.add_object(Stream::new(dictionary! {}, bytes));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0i64.into(), 0i64.into(), 612i64.into(), 792i64.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = doc.save_to(&mut out);
    Bytes::from(out)
}

/// A verified education issuer, `issuer_1` owned by `user_1`.
pub fn verified_issuer() -> Issuer {
    Issuer {
        id: "issuer_1".into(),
        user_id: "user_1".into(),
        organization_name: "State University".into(),
        kind: IssuerKind::Education,
        description: "Public research university".into(),
        status: IssuerStatus::Verified,
        created_at: 1_600_000_000_000,
        approved_at: Some(1_600_000_100_000),
        approved_by: Some("admin".into()),
    }
}

/// Valid metadata for a document titled `title`.
pub fn metadata(title: &str) -> DocumentMetadata {
    DocumentMetadata {
        title: title.into(),
        description: "Bachelor of Science".into(),
        document_type: "certificate".into(),
        recipient_name: "Sam Doe".into(),
        recipient_email: "sam.doe@example.org".into(),
        original_file_name: Some(format!("{}.pdf", title)),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Identifier source
// ─────────────────────────────────────────────────────────────────────────────

/// Hands out a fixed sequence of identifiers, then random ones.
#[derive(Default)]
pub struct FixedIdGenerator {
    queue: Mutex<VecDeque<DocumentId>>,
}

impl FixedIdGenerator {
    pub fn new(ids: impl IntoIterator<Item = DocumentId>) -> Self {
        Self {
            queue: Mutex::new(ids.into_iter().collect()),
        }
    }

    /// Parse `ids`; fails on the first malformed one.
    pub fn from_strs(ids: &[&str]) -> Result<Self, CoreError> {
        let ids = ids
            .iter()
            .map(|s| DocumentId::parse(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(ids))
    }

    /// Identifiers not yet handed out.
    pub fn remaining(&self) -> usize {
        self.queue.lock().unwrap().len()
    }
}

impl IdGenerator for FixedIdGenerator {
    fn generate(&self) -> DocumentId {
        self.queue.lock().unwrap().pop_front().unwrap_or_else(generate)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Service fixture
// ─────────────────────────────────────────────────────────────────────────────

/// An issuance service and a resolver sharing in-memory stores.
pub struct TestFixture {
    pub store: Arc<MemoryStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub issuance: IssuanceService<MemoryStore, MemoryBlobStore>,
    pub resolver: VerificationResolver<MemoryStore>,
    pub issuer: Issuer,
}

impl TestFixture {
    /// A fixture with random identifiers.
    pub fn new() -> Self {
        Self::with_ids(Arc::new(RandomIdGenerator))
    }

    /// A fixture whose issuance draws identifiers from `ids`.
    pub fn with_ids(ids: Arc<dyn IdGenerator>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let issuance =
            IssuanceService::new(store.clone(), blobs.clone(), ServiceConfig::with_origin(ORIGIN))
                .with_id_generator(ids);
        let resolver = VerificationResolver::new(store.clone());
        Self {
            store,
            blobs,
            issuance,
            resolver,
            issuer: verified_issuer(),
        }
    }

    /// Issue `pdf` as the fixture's issuer.
    pub async fn issue(&self, title: &str, pdf: Bytes) -> legitcheck::Result<Document> {
        self.issuance.issue(&self.issuer, pdf, metadata(title)).await
    }

    /// The stamped bytes stored for `doc`.
    pub async fn stamped_bytes(&self, doc: &Document) -> Option<Bytes> {
        self.blobs.get(&doc.document_url).await.ok().flatten()
    }

    pub async fn verify_id(&self, id: &str) -> Resolution {
        self.resolve(VerificationRequest::Identifier(id.to_string()))
            .await
    }

    pub async fn verify_payload(&self, payload: &str) -> Resolution {
        self.resolve(VerificationRequest::ScannedPayload(payload.to_string()))
            .await
    }

    pub async fn verify_bytes(&self, bytes: Bytes) -> Resolution {
        self.resolve(VerificationRequest::Upload(bytes)).await
    }

    async fn resolve(&self, request: VerificationRequest) -> Resolution {
        self.resolver
            .resolve(request, &RequestContext::default())
            .await
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Failure injection
// ─────────────────────────────────────────────────────────────────────────────

/// A memory blob store whose writes can be made to fail.
#[derive(Default)]
pub struct FailingBlobStore {
    pub inner: MemoryBlobStore,
    fail_puts: AtomicBool,
    deletes: AtomicUsize,
}

impl FailingBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every upload.
    pub fn rejecting() -> Self {
        let store = Self::default();
        store.fail_puts(true);
        store
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Number of delete calls seen.
    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for FailingBlobStore {
    async fn put(&self, path: &str, bytes: Bytes, content_type: &str) -> legitcheck_store::Result<String> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StoreError::BlobRejected(format!("upload of {} refused", path)));
        }
        self.inner.put(path, bytes, content_type).await
    }

    async fn get(&self, url: &str) -> legitcheck_store::Result<Option<Bytes>> {
        self.inner.get(url).await
    }

    async fn delete(&self, url: &str) -> legitcheck_store::Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(url).await
    }
}

/// A memory registry with switchable failures.
#[derive(Default)]
pub struct FailingStore {
    pub inner: MemoryStore,
    fail_inserts: AtomicBool,
    fail_reads: AtomicBool,
    fail_logs: AtomicBool,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Fail document lookups and scans.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_logs(&self, fail: bool) {
        self.fail_logs.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, what: &str) -> legitcheck_store::Result<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("injected {} failure", what),
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn insert_document(&self, doc: &Document) -> legitcheck_store::Result<InsertResult> {
        Self::check(&self.fail_inserts, "insert")?;
        self.inner.insert_document(doc).await
    }

    async fn get_document(&self, id: &DocumentId) -> legitcheck_store::Result<Option<Document>> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.get_document(id).await
    }

    async fn revoke_document(
        &self,
        id: &DocumentId,
        revocation: &Revocation,
    ) -> legitcheck_store::Result<RevokeOutcome> {
        self.inner.revoke_document(id, revocation).await
    }

    async fn scan_documents(
        &self,
        predicate: DocumentPredicate<'_>,
    ) -> legitcheck_store::Result<Vec<Document>> {
        Self::check(&self.fail_reads, "scan")?;
        self.inner.scan_documents(predicate).await
    }

    async fn find_documents_by_hash(
        &self,
        hash: &ContentHash,
    ) -> legitcheck_store::Result<Vec<Document>> {
        Self::check(&self.fail_reads, "scan")?;
        self.inner.find_documents_by_hash(hash).await
    }

    async fn put_issuer(&self, issuer: &Issuer) -> legitcheck_store::Result<()> {
        self.inner.put_issuer(issuer).await
    }

    async fn get_issuer(&self, id: &str) -> legitcheck_store::Result<Option<Issuer>> {
        self.inner.get_issuer(id).await
    }

    async fn append_log(&self, entry: &VerificationLogEntry) -> legitcheck_store::Result<()> {
        Self::check(&self.fail_logs, "log append")?;
        self.inner.append_log(entry).await
    }

    async fn recent_logs(&self, limit: usize) -> legitcheck_store::Result<Vec<VerificationLogEntry>> {
        self.inner.recent_logs(limit).await
    }

    async fn log_count(&self) -> legitcheck_store::Result<u64> {
        self.inner.log_count().await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Camera
// ─────────────────────────────────────────────────────────────────────────────

/// A camera that replays decoded payloads.
pub struct ScriptedFrames {
    frames: VecDeque<Result<Option<String>, ScanError>>,
    released: Arc<AtomicUsize>,
    hang_when_empty: bool,
}

impl ScriptedFrames {
    pub fn new<I, T>(payloads: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            frames: payloads.into_iter().map(|p| Ok(Some(p.into()))).collect(),
            released: Arc::new(AtomicUsize::new(0)),
            hang_when_empty: false,
        }
    }

    /// Fail with `error` after the scripted payloads.
    pub fn then_fail(mut self, error: ScanError) -> Self {
        self.frames.push_back(Err(error));
        self
    }

    /// Keep the camera open, producing nothing, once the script runs out.
    pub fn then_hang(mut self) -> Self {
        self.hang_when_empty = true;
        self
    }

    /// Counts `release` calls; survives the source being moved into a scan.
    pub fn release_counter(&self) -> Arc<AtomicUsize> {
        self.released.clone()
    }
}

#[async_trait]
impl FrameSource for ScriptedFrames {
    async fn next_frame(&mut self) -> Result<Option<String>, ScanError> {
        match self.frames.pop_front() {
            Some(frame) => frame,
            None if self.hang_when_empty => std::future::pending().await,
            None => Ok(None),
        }
    }

    fn release(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}
