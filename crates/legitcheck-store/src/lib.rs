//! # LegitCheck Store
//!
//! Storage abstraction for LegitCheck. Provides trait-based interfaces for the
//! document registry and for blob storage, with SQLite, filesystem and
//! in-memory implementations.
//!
//! ## Key Types
//!
//! - [`DocumentStore`] - Documents, issuers and the verification log
//! - [`BlobStore`] - Stamped PDF bytes behind retrievable URLs
//! - [`SqliteStore`] - SQLite-based persistent registry
//! - [`MemoryStore`] - In-memory registry for tests
//! - [`FsBlobStore`] / [`MemoryBlobStore`] - Blob backends
//!
//! ## Usage
//!
//! ```rust,no_run
//! use legitcheck_store::{DocumentStore, SqliteStore};
//!
//! async fn example() {
//!     let store = SqliteStore::open("registry.db").unwrap();
//!     let recent = store.recent_logs(20).await.unwrap();
//!     println!("{} verification attempts", recent.len());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Create-if-absent**: inserting an existing id returns `AlreadyExists`
//! - **Atomic revocation**: `active -> revoked` is a single compare-and-set
//! - **Validation at the boundary**: records are validated before they are
//!   written

pub mod blob;
pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use blob::{FsBlobStore, MemoryBlobStore};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{BlobStore, DocumentPredicate, DocumentStore, InsertResult, RevokeOutcome};
