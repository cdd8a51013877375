//! End-to-end scenarios: issue, resolve, revoke, scan.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use legitcheck::{
    IssuanceService, RequestContext, ServiceConfig, ServiceError, VerificationRequest,
    VerificationResolver,
};
use legitcheck_core::{
    derive_verification_url, digest, is_valid_format, DocumentId, DocumentStatus, LogResult,
    MatchMethod, RevocationError, Verdict,
};
use legitcheck_stamp::{scan, stamp, ScanCanceller, ScanError, ScanOutcome};
use legitcheck_store::{BlobStore, DocumentStore, FsBlobStore, MemoryBlobStore, SqliteStore};
use legitcheck_testkit::fixtures::{metadata, ORIGIN};
use legitcheck_testkit::{
    sample_pdf, verified_issuer, FailingBlobStore, FailingStore, FixedIdGenerator,
    ScriptedFrames, TestFixture,
};

const ID: &str = "doc_1700000000000_abc123xyz";

fn fixed(ids: &[&str]) -> TestFixture {
    TestFixture::with_ids(Arc::new(FixedIdGenerator::from_strs(ids).unwrap()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Stamping and identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn stamped_hash_is_stable_and_differs_from_upload() {
    let pdf = sample_pdf(2, "Transcript");
    let url = format!("{}/verify?id={}", ORIGIN, ID);

    let a = stamp(&pdf, &url).unwrap();
    let b = stamp(&pdf, &url).unwrap();
    assert_eq!(digest(&a), digest(&b));
    assert_ne!(digest(&a), digest(&pdf));
}

#[tokio::test]
async fn issued_document_url_is_derived_from_id() {
    let fixture = TestFixture::new();
    let doc = fixture
        .issue("Diploma", sample_pdf(1, "Diploma"))
        .await
        .unwrap();

    assert!(is_valid_format(doc.id.as_str()));
    assert_eq!(derive_verification_url(&doc.id, ORIGIN), doc.verification_url);
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolution
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn issue_then_resolve_by_id_bytes_and_junk() {
    let fixture = fixed(&[ID]);
    let doc = fixture
        .issue("Diploma", sample_pdf(1, "Diploma"))
        .await
        .unwrap();

    let by_id = fixture.verify_id(ID).await;
    assert_eq!(by_id.verdict, Verdict::Valid);
    assert_eq!(by_id.document.as_ref(), Some(&doc));

    let stamped = fixture.stamped_bytes(&doc).await.unwrap();
    let by_bytes = fixture.verify_bytes(stamped).await;
    assert_eq!(by_bytes.verdict, Verdict::Valid);
    assert_eq!(by_bytes.document.unwrap().id, doc.id);

    let junk = fixture
        .verify_bytes(Bytes::from_static(b"%PDF-1.4 unrelated"))
        .await;
    assert_eq!(junk.verdict, Verdict::NotFound);
    assert!(junk.attempted.starts_with("sha256:"));
}

#[tokio::test]
async fn hash_only_record_resolves_without_identifier() {
    let fixture = fixed(&[ID]);
    let doc = fixture
        .issue("Diploma", sample_pdf(1, "Diploma"))
        .await
        .unwrap();

    // A record whose file carries no identifier: the hash is the only link.
    let file = sample_pdf(1, "Imported record");
    let mut imported = doc.clone();
    imported.id = DocumentId::parse("doc_1600000000000_imported").unwrap();
    imported.verification_url = derive_verification_url(&imported.id, ORIGIN);
    imported.hash = digest(&file);
    fixture.store.insert_document(&imported).await.unwrap();

    let res = fixture.verify_bytes(file).await;
    assert_eq!(res.verdict, Verdict::Valid);
    assert_eq!(res.matched_by, Some(MatchMethod::ContentHash));
    assert_eq!(res.document.unwrap().id, imported.id);
}

#[tokio::test]
async fn revoked_document_resolves_revoked() {
    let fixture = fixed(&[ID]);
    let doc = fixture
        .issue("Diploma", sample_pdf(1, "Diploma"))
        .await
        .unwrap();
    assert_eq!(doc.id.as_str(), ID);

    fixture
        .issuance
        .revoke(&doc.id, "issuer_1", Some("error"))
        .await
        .unwrap();

    let res = fixture.verify_id(ID).await;
    assert_eq!(res.verdict, Verdict::Revoked);
    assert_eq!(res.message(), "Document has been revoked by the issuer");
    let found = res.document.unwrap();
    assert_eq!(found.revoked_by(), Some("issuer_1"));
    assert_eq!(found.revoked_reason(), Some("error"));
}

#[tokio::test]
async fn embedded_url_wins_over_hash_scan() {
    let fixture = fixed(&[ID]);
    fixture
        .issue("Diploma", sample_pdf(1, "Diploma"))
        .await
        .unwrap();

    let bytes = Bytes::from(format!(
        "%PDF-1.7 retyped copy ... (Verify at:) ({}/verify?id={}) ... %%EOF",
        ORIGIN, ID
    ));
    let res = fixture.verify_bytes(bytes).await;
    assert_eq!(res.verdict, Verdict::Valid);
    assert_eq!(res.matched_by, Some(MatchMethod::EmbeddedIdentifier));
    assert_eq!(res.attempted, ID);
    assert_eq!(res.candidates, 0);
}

#[tokio::test]
async fn never_issued_identifier_logs_invalid() {
    let fixture = TestFixture::new();

    let res = fixture.verify_id("doc_1_neverissued").await;
    assert_eq!(res.verdict, Verdict::NotFound);

    let logs = fixture.resolver.recent_logs(10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].result, LogResult::Invalid);
    assert_eq!(logs[0].document_id, "doc_1_neverissued");
}

#[tokio::test]
async fn each_resolution_logs_once() {
    let fixture = fixed(&[ID]);
    let doc = fixture
        .issue("Diploma", sample_pdf(1, "Diploma"))
        .await
        .unwrap();
    let stamped = fixture.stamped_bytes(&doc).await.unwrap();

    let mut expected = 0;
    for _ in 0..3 {
        fixture.verify_id(ID).await;
        fixture.verify_payload(&doc.verification_url).await;
        fixture.verify_payload("not a code").await;
        fixture.verify_bytes(stamped.clone()).await;
        expected += 4;
        assert_eq!(fixture.resolver.log_count().await.unwrap(), expected);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Revocation
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn revoking_twice_keeps_first_revocation() {
    let fixture = fixed(&[ID]);
    let doc = fixture
        .issue("Diploma", sample_pdf(1, "Diploma"))
        .await
        .unwrap();

    let first = fixture
        .issuance
        .revoke(&doc.id, "issuer_1", Some("error"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = fixture.issuance.revoke(&doc.id, "issuer_2", None).await;
    assert!(matches!(
        second,
        Err(ServiceError::Revocation(RevocationError::AlreadyRevoked))
    ));

    let stored = fixture.issuance.document(&doc.id).await.unwrap();
    assert_eq!(stored.status, DocumentStatus::Revoked);
    assert_eq!(stored.revoked_at(), first.revoked_at());
    assert_eq!(stored.revoked_by(), Some("issuer_1"));
}

#[tokio::test]
async fn concurrent_revocations_on_sqlite_have_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::open(dir.path().join("registry.db")).unwrap());
    let blobs = Arc::new(FsBlobStore::open_file_urls(dir.path().join("blobs")).unwrap());
    let issuance = Arc::new(
        IssuanceService::new(store.clone(), blobs, ServiceConfig::with_origin(ORIGIN))
            .with_id_generator(Arc::new(FixedIdGenerator::from_strs(&[ID]).unwrap())),
    );

    let doc = issuance
        .issue(&verified_issuer(), sample_pdf(1, "Diploma"), metadata("Diploma"))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for actor in ["issuer_1", "issuer_2", "issuer_3", "issuer_4"] {
        let issuance = issuance.clone();
        let id = doc.id.clone();
        handles.push(tokio::spawn(async move {
            issuance.revoke(&id, actor, None).await
        }));
    }

    let mut winners = Vec::new();
    let mut already = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(doc) => winners.push(doc),
            Err(ServiceError::Revocation(RevocationError::AlreadyRevoked)) => already += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(winners.len(), 1);
    assert_eq!(already, 3);

    let stored = store.get_document(&doc.id).await.unwrap().unwrap();
    assert_eq!(stored.revoked_by(), winners[0].revoked_by());
}

// ─────────────────────────────────────────────────────────────────────────────
// Failures during issuance
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_failure_leaves_no_record() {
    let store = Arc::new(FailingStore::new());
    let blobs = Arc::new(FailingBlobStore::rejecting());
    let issuance = IssuanceService::new(store.clone(), blobs, ServiceConfig::with_origin(ORIGIN));

    let err = issuance
        .issue(&verified_issuer(), sample_pdf(1, "x"), metadata("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::UploadFailure(_)));
    assert_eq!(store.inner.document_count(), 0);
}

#[tokio::test]
async fn failed_insert_deletes_uploaded_blob() {
    let store = Arc::new(FailingStore::new());
    let blobs = Arc::new(FailingBlobStore::new());
    store.fail_inserts(true);
    let issuance =
        IssuanceService::new(store.clone(), blobs.clone(), ServiceConfig::with_origin(ORIGIN));

    let err = issuance
        .issue(&verified_issuer(), sample_pdf(1, "x"), metadata("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Store(_)));
    assert_eq!(blobs.deletes(), 1);
    assert!(blobs.inner.is_empty());
    assert_eq!(store.inner.document_count(), 0);
}

#[tokio::test]
async fn malformed_upload_is_rejected_before_upload() {
    let blobs = Arc::new(FailingBlobStore::new());
    let issuance = IssuanceService::new(
        Arc::new(FailingStore::new()),
        blobs.clone(),
        ServiceConfig::with_origin(ORIGIN),
    );

    let err = issuance
        .issue(
            &verified_issuer(),
            Bytes::from_static(b"PK\x03\x04 a zip file"),
            metadata("x"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::MalformedDocument(_)));
    assert!(blobs.inner.is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Failures during resolution
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn store_errors_resolve_to_not_found() {
    let store = Arc::new(FailingStore::new());
    let blobs = Arc::new(MemoryBlobStore::new());
    let issuance = IssuanceService::new(store.clone(), blobs.clone(), ServiceConfig::with_origin(ORIGIN))
        .with_id_generator(Arc::new(FixedIdGenerator::from_strs(&[ID]).unwrap()));
    let resolver = VerificationResolver::new(store.clone());
    let doc = issuance
        .issue(&verified_issuer(), sample_pdf(1, "x"), metadata("x"))
        .await
        .unwrap();
    let stamped = blobs.get(&doc.document_url).await.unwrap().unwrap();

    store.fail_reads(true);
    let ctx = RequestContext::default();
    let res = resolver
        .resolve(VerificationRequest::Identifier(ID.into()), &ctx)
        .await;
    assert_eq!(res.verdict, Verdict::NotFound);
    let res = resolver.resolve(VerificationRequest::Upload(stamped), &ctx).await;
    assert_eq!(res.verdict, Verdict::NotFound);
    assert_eq!(res.attempted, ID);

    assert_eq!(resolver.log_count().await.unwrap(), 2);
}

#[tokio::test]
async fn failed_log_append_still_answers() {
    let store = Arc::new(FailingStore::new());
    let resolver = VerificationResolver::new(store.clone());
    store.fail_logs(true);

    let res = resolver
        .resolve(
            VerificationRequest::Identifier("doc_1_x".into()),
            &RequestContext::default(),
        )
        .await;
    assert_eq!(res.verdict, Verdict::NotFound);
    assert_eq!(resolver.log_count().await.unwrap(), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Scanning
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn scanned_code_resolves_after_noise() {
    let fixture = fixed(&[ID]);
    let doc = fixture
        .issue("Diploma", sample_pdf(1, "Diploma"))
        .await
        .unwrap();

    let camera = ScriptedFrames::new(["", "BEGIN:VCARD", doc.verification_url.as_str()]);
    let released = camera.release_counter();
    let (_canceller, signal) = ScanCanceller::channel();

    let report = scan(camera, signal).await.unwrap();
    assert_eq!(released.load(Ordering::SeqCst), 1);
    assert_eq!(report.noise, 2);
    let ScanOutcome::Accepted(token) = report.outcome else {
        panic!("scan did not accept a code: {:?}", report.outcome);
    };

    let res = fixture.verify_id(token.id.as_str()).await;
    assert_eq!(res.verdict, Verdict::Valid);
}

#[tokio::test]
async fn cancelled_scan_releases_camera() {
    let camera = ScriptedFrames::new(["noise"]).then_hang();
    let released = camera.release_counter();
    let (canceller, signal) = ScanCanceller::channel();

    let task = tokio::spawn(scan(camera, signal));
    tokio::time::sleep(Duration::from_millis(20)).await;
    canceller.cancel();

    let report = task.await.unwrap().unwrap();
    assert_eq!(report.outcome, ScanOutcome::Cancelled);
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn camera_failure_releases_camera() {
    let camera = ScriptedFrames::new(["noise"])
        .then_fail(ScanError::CameraUnavailable("no device".into()));
    let released = camera.release_counter();
    let (_canceller, signal) = ScanCanceller::channel();

    let err = scan(camera, signal).await.unwrap_err();
    assert!(matches!(err, ScanError::CameraUnavailable(_)));
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Persistent backends
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sqlite_and_fs_survive_reopen() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("registry.db");
    let blob_root = dir.path().join("blobs");

    let doc = {
        let store = Arc::new(SqliteStore::open(&db).unwrap());
        let blobs = Arc::new(FsBlobStore::open_file_urls(&blob_root).unwrap());
        let issuance = IssuanceService::new(store.clone(), blobs, ServiceConfig::with_origin(ORIGIN))
            .with_id_generator(Arc::new(FixedIdGenerator::from_strs(&[ID]).unwrap()));
        let doc = issuance
            .issue(&verified_issuer(), sample_pdf(2, "Transcript"), metadata("Transcript"))
            .await
            .unwrap();
        assert!(issuance.audit_blob(&doc.id).await.unwrap().is_intact());
        doc
    };

    let store = Arc::new(SqliteStore::open(&db).unwrap());
    let blobs = FsBlobStore::open_file_urls(&blob_root).unwrap();
    let resolver = VerificationResolver::new(store.clone());

    let stamped = blobs.get(&doc.document_url).await.unwrap().unwrap();
    assert_eq!(digest(&stamped), doc.hash);

    let res = resolver
        .resolve(VerificationRequest::Upload(stamped), &RequestContext::default())
        .await;
    assert_eq!(res.verdict, Verdict::Valid);
    assert_eq!(res.document.unwrap(), doc);
    assert_eq!(store.find_documents_by_hash(&doc.hash).await.unwrap().len(), 1);
}
