//! Offloading CPU-bound work from the async runtime.

use bytes::Bytes;
use legitcheck_core::{digest, ContentHash};

use crate::error::{Result, ServiceError};

/// Run `f` on the blocking pool.
pub(crate) async fn run<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServiceError::Task(e.to_string()))
}

/// SHA-256 of `bytes`, computed off the runtime.
pub(crate) async fn digest_bytes(bytes: Bytes) -> Result<ContentHash> {
    run(move || digest(&bytes)).await
}
