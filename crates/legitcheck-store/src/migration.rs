//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use legitcheck_core::now_millis;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
            tracing::debug!(version, "applied schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: documents, issuers, verification logs.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Registry of issued documents
        CREATE TABLE documents (
            id TEXT PRIMARY KEY,              -- doc_<unixMillis>_<base36>
            issuer_id TEXT NOT NULL,
            issuer_name TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            document_type TEXT NOT NULL,
            recipient_name TEXT NOT NULL,
            recipient_email TEXT NOT NULL,
            hash TEXT NOT NULL,               -- lowercase hex SHA-256 of stamped bytes
            status TEXT NOT NULL CHECK (status IN ('active', 'revoked')),
            issued_at INTEGER NOT NULL,
            revoked_at INTEGER,
            revoked_by TEXT,
            revoked_reason TEXT,
            verification_url TEXT NOT NULL,
            qr_code_data TEXT NOT NULL,
            document_url TEXT NOT NULL,
            original_file_name TEXT
        );

        -- Organizations allowed to issue
        CREATE TABLE issuers (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            organization_name TEXT NOT NULL,
            kind TEXT NOT NULL,               -- education | healthcare
            description TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL,             -- pending | verified | rejected
            created_at INTEGER NOT NULL,
            approved_at INTEGER,
            approved_by TEXT
        );

        -- Append-only audit log, one row per verification attempt
        CREATE TABLE verification_logs (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            document_id TEXT NOT NULL,        -- raw identifier attempted, may be unresolved
            timestamp INTEGER NOT NULL,
            result TEXT NOT NULL,             -- valid | invalid | revoked
            ip_address TEXT,
            user_agent TEXT
        );

        CREATE INDEX idx_documents_hash ON documents(hash);
        CREATE INDEX idx_documents_issuer ON documents(issuer_id, issued_at);
        CREATE INDEX idx_logs_timestamp ON verification_logs(timestamp);
        "#,
    )?;

    Ok(())
}
