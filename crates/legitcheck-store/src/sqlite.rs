//! SQLite implementation of the DocumentStore trait.
//!
//! This is the primary storage backend for LegitCheck. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use legitcheck_core::{
    validate_document, validate_issuer, ContentHash, Document, DocumentId, DocumentStatus, Issuer,
    IssuerKind, IssuerStatus, LogResult, Revocation, VerificationLogEntry,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{DocumentPredicate, DocumentStore, InsertResult, RevokeOutcome};

const DOCUMENT_COLUMNS: &str = "id, issuer_id, issuer_name, title, description, document_type,
     recipient_name, recipient_email, hash, status, issued_at, revoked_at, revoked_by,
     revoked_reason, verification_url, qr_code_data, document_url, original_file_name";

const ISSUER_COLUMNS: &str = "id, user_id, organization_name, kind, description, status,
     created_at, approved_at, approved_by";

const LOG_COLUMNS: &str = "id, document_id, timestamp, result, ip_address, user_agent";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|e| {
                StoreError::Database(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                    Some(format!("mutex poisoned: {}", e)),
                ))
            })?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        Box::new(StoreError::Serialization(message)),
    )
}

// Helper to convert a row to Document
fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
    let id: String = row.get("id")?;
    let id = DocumentId::parse(&id).map_err(|e| conversion_error(0, e.to_string()))?;

    let hash: String = row.get("hash")?;
    let hash = ContentHash::from_hex(&hash).map_err(|e| conversion_error(8, e.to_string()))?;

    let status: String = row.get("status")?;
    let status = DocumentStatus::parse(&status)
        .ok_or_else(|| conversion_error(9, format!("unknown document status {:?}", status)))?;

    let revoked_at: Option<i64> = row.get("revoked_at")?;
    let revoked_by: Option<String> = row.get("revoked_by")?;
    let revocation = match (revoked_at, revoked_by) {
        (Some(revoked_at), Some(revoked_by)) => Some(Revocation {
            revoked_at,
            revoked_by,
            reason: row.get("revoked_reason")?,
        }),
        _ => None,
    };

    Ok(Document {
        id,
        issuer_id: row.get("issuer_id")?,
        issuer_name: row.get("issuer_name")?,
        title: row.get("title")?,
        description: row.get("description")?,
        document_type: row.get("document_type")?,
        recipient_name: row.get("recipient_name")?,
        recipient_email: row.get("recipient_email")?,
        hash,
        status,
        issued_at: row.get("issued_at")?,
        revocation,
        verification_url: row.get("verification_url")?,
        qr_code_data: row.get("qr_code_data")?,
        document_url: row.get("document_url")?,
        original_file_name: row.get("original_file_name")?,
    })
}

// Helper to convert a row to Issuer
fn row_to_issuer(row: &rusqlite::Row<'_>) -> rusqlite::Result<Issuer> {
    let kind: String = row.get("kind")?;
    let kind = IssuerKind::parse(&kind)
        .ok_or_else(|| conversion_error(3, format!("unknown issuer type {:?}", kind)))?;

    let status: String = row.get("status")?;
    let status = IssuerStatus::parse(&status)
        .ok_or_else(|| conversion_error(5, format!("unknown issuer status {:?}", status)))?;

    Ok(Issuer {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        organization_name: row.get("organization_name")?,
        kind,
        description: row.get("description")?,
        status,
        created_at: row.get("created_at")?,
        approved_at: row.get("approved_at")?,
        approved_by: row.get("approved_by")?,
    })
}

// Helper to convert a row to VerificationLogEntry
fn row_to_log(row: &rusqlite::Row<'_>) -> rusqlite::Result<VerificationLogEntry> {
    let result: String = row.get("result")?;
    let result = LogResult::parse(&result)
        .ok_or_else(|| conversion_error(3, format!("unknown log result {:?}", result)))?;

    Ok(VerificationLogEntry {
        id: row.get("id")?,
        document_id: row.get("document_id")?,
        timestamp: row.get("timestamp")?,
        result,
        ip_address: row.get("ip_address")?,
        user_agent: row.get("user_agent")?,
    })
}

fn select_document(conn: &Connection, id: &str) -> Result<Option<Document>> {
    conn.query_row(
        &format!("SELECT {} FROM documents WHERE id = ?1", DOCUMENT_COLUMNS),
        params![id],
        row_to_document,
    )
    .optional()
    .map_err(StoreError::from)
}

fn select_documents(
    conn: &Connection,
    filter: &str,
    args: impl rusqlite::Params,
) -> Result<Vec<Document>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM documents {}",
        DOCUMENT_COLUMNS, filter
    ))?;
    let docs = stmt
        .query_map(args, row_to_document)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(docs)
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn insert_document(&self, doc: &Document) -> Result<InsertResult> {
        validate_document(doc)?;
        let doc = doc.clone();

        self.with_conn(move |conn| {
            let changed = conn.execute(
                &format!(
                    "INSERT INTO documents ({}) VALUES
                     (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
                     ON CONFLICT(id) DO NOTHING",
                    DOCUMENT_COLUMNS
                ),
                params![
                    doc.id.as_str(),
                    doc.issuer_id,
                    doc.issuer_name,
                    doc.title,
                    doc.description,
                    doc.document_type,
                    doc.recipient_name,
                    doc.recipient_email,
                    doc.hash.to_hex(),
                    doc.status.as_str(),
                    doc.issued_at,
                    doc.revoked_at(),
                    doc.revoked_by(),
                    doc.revoked_reason(),
                    doc.verification_url,
                    doc.qr_code_data,
                    doc.document_url,
                    doc.original_file_name,
                ],
            )?;

            if changed == 0 {
                Ok(InsertResult::AlreadyExists)
            } else {
                Ok(InsertResult::Inserted)
            }
        })
        .await
    }

    async fn get_document(&self, id: &DocumentId) -> Result<Option<Document>> {
        let id = id.clone();
        self.with_conn(move |conn| select_document(conn, id.as_str()))
            .await
    }

    async fn revoke_document(
        &self,
        id: &DocumentId,
        revocation: &Revocation,
    ) -> Result<RevokeOutcome> {
        let id = id.clone();
        let revocation = revocation.clone();

        self.with_conn(move |conn| {
            // Compare-and-set: only an active row is updated.
            let changed = conn.execute(
                "UPDATE documents
                 SET status = 'revoked', revoked_at = ?2, revoked_by = ?3, revoked_reason = ?4
                 WHERE id = ?1 AND status = 'active'",
                params![
                    id.as_str(),
                    revocation.revoked_at,
                    revocation.revoked_by,
                    revocation.reason,
                ],
            )?;

            let current = select_document(conn, id.as_str())?;
            Ok(match (changed, current) {
                (_, None) => RevokeOutcome::NotFound,
                (0, Some(doc)) => RevokeOutcome::AlreadyRevoked(doc),
                (_, Some(doc)) => RevokeOutcome::Revoked(doc),
            })
        })
        .await
    }

    async fn scan_documents(&self, predicate: DocumentPredicate<'_>) -> Result<Vec<Document>> {
        let all = self
            .with_conn(|conn| select_documents(conn, "", []))
            .await?;
        Ok(all.into_iter().filter(|doc| predicate(doc)).collect())
    }

    async fn find_documents_by_hash(&self, hash: &ContentHash) -> Result<Vec<Document>> {
        let hash = hash.to_hex();
        self.with_conn(move |conn| select_documents(conn, "WHERE hash = ?1", params![hash]))
            .await
    }

    async fn documents_by_issuer(&self, issuer_id: &str) -> Result<Vec<Document>> {
        let issuer_id = issuer_id.to_string();
        self.with_conn(move |conn| {
            select_documents(
                conn,
                "WHERE issuer_id = ?1 ORDER BY issued_at DESC, id DESC",
                params![issuer_id],
            )
        })
        .await
    }

    async fn put_issuer(&self, issuer: &Issuer) -> Result<()> {
        validate_issuer(issuer)?;
        let issuer = issuer.clone();

        self.with_conn(move |conn| {
            conn.execute(
                &format!(
                    "INSERT OR REPLACE INTO issuers ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    ISSUER_COLUMNS
                ),
                params![
                    issuer.id,
                    issuer.user_id,
                    issuer.organization_name,
                    issuer.kind.as_str(),
                    issuer.description,
                    issuer.status.as_str(),
                    issuer.created_at,
                    issuer.approved_at,
                    issuer.approved_by,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_issuer(&self, id: &str) -> Result<Option<Issuer>> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM issuers WHERE id = ?1", ISSUER_COLUMNS),
                params![id],
                row_to_issuer,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn append_log(&self, entry: &VerificationLogEntry) -> Result<()> {
        let entry = entry.clone();
        self.with_conn(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO verification_logs ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    LOG_COLUMNS
                ),
                params![
                    entry.id,
                    entry.document_id,
                    entry.timestamp,
                    entry.result.as_str(),
                    entry.ip_address,
                    entry.user_agent,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn recent_logs(&self, limit: usize) -> Result<Vec<VerificationLogEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM verification_logs ORDER BY seq DESC LIMIT ?1",
                LOG_COLUMNS
            ))?;
            let logs = stmt
                .query_map(params![limit], row_to_log)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(logs)
        })
        .await
    }

    async fn log_count(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM verification_logs", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }
}
