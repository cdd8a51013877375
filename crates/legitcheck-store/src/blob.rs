//! Blob stores for stamped PDFs.
//!
//! [`MemoryBlobStore`] backs tests; [`FsBlobStore`] writes under a root
//! directory and hands out URLs under a configurable base.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncWriteExt;

use crate::error::{Result, StoreError};
use crate::traits::BlobStore;

const MEMORY_SCHEME: &str = "memory://";

/// Blob paths are relative and may not climb out of the store root.
fn check_path(path: &str) -> Result<&Path> {
    let p = Path::new(path);
    let clean = !path.is_empty()
        && p.components().all(|c| matches!(c, Component::Normal(_)));
    if clean {
        Ok(p)
    } else {
        Err(StoreError::BlobRejected(format!("invalid blob path {:?}", path)))
    }
}

/// In-memory blob store.
///
/// URLs are `memory://{path}`.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, StoredBlob>>,
}

struct StoredBlob {
    bytes: Bytes,
    content_type: String,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Content type recorded for `url`.
    pub fn content_type(&self, url: &str) -> Option<String> {
        let path = url.strip_prefix(MEMORY_SCHEME)?;
        self.blobs
            .read()
            .unwrap()
            .get(path)
            .map(|b| b.content_type.clone())
    }

    /// Overwrite the blob behind `url`, bypassing path checks.
    ///
    /// Lets tests simulate corruption of already-stored content.
    pub fn tamper(&self, url: &str, bytes: Bytes) -> bool {
        let Some(path) = url.strip_prefix(MEMORY_SCHEME) else {
            return false;
        };
        match self.blobs.write().unwrap().get_mut(path) {
            Some(blob) => {
                blob.bytes = bytes;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, path: &str, bytes: Bytes, content_type: &str) -> Result<String> {
        check_path(path)?;
        match self.blobs.write().unwrap().entry(path.to_string()) {
            Entry::Occupied(_) => return Err(StoreError::BlobExists(path.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(StoredBlob {
                    bytes,
                    content_type: content_type.to_string(),
                });
            }
        }
        Ok(format!("{}{}", MEMORY_SCHEME, path))
    }

    async fn get(&self, url: &str) -> Result<Option<Bytes>> {
        let Some(path) = url.strip_prefix(MEMORY_SCHEME) else {
            return Ok(None);
        };
        Ok(self.blobs.read().unwrap().get(path).map(|b| b.bytes.clone()))
    }

    async fn delete(&self, url: &str) -> Result<()> {
        if let Some(path) = url.strip_prefix(MEMORY_SCHEME) {
            self.blobs.write().unwrap().remove(path);
        }
        Ok(())
    }
}

/// Filesystem blob store.
///
/// Blobs live at `{root}/{path}`; their URL is `{base_url}/{path}`. Files are
/// created exclusively, so an existing blob is never overwritten. The base
/// URL is whatever serves `root` (a static file server, or `file://`).
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    base_url: String,
}

impl FsBlobStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// A store whose URLs are `file://` URLs of the root directory.
    pub fn open_file_urls(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        let root = root.canonicalize()?;
        let base_url = format!("file://{}", root.display());
        Ok(Self { root, base_url })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let rel = url.strip_prefix(&self.base_url)?.strip_prefix('/')?;
        check_path(rel).ok().map(|p| self.root.join(p))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, path: &str, bytes: Bytes, content_type: &str) -> Result<String> {
        let rel = check_path(path)?;
        let full = self.root.join(rel);

        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StoreError::BlobExists(path.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let written = async {
            file.write_all(&bytes).await?;
            file.sync_all().await
        }
        .await;
        if let Err(e) = written {
            // A partial file would block every retry at this path.
            if let Err(rm) = tokio::fs::remove_file(&full).await {
                tracing::warn!(path, error = %rm, "failed to remove partial blob");
            }
            return Err(e.into());
        }
        tracing::debug!(path, content_type, size = bytes.len(), "stored blob");

        Ok(format!("{}/{}", self.base_url, path))
    }

    async fn get(&self, url: &str) -> Result<Option<Bytes>> {
        let Some(full) = self.path_for_url(url) else {
            return Ok(None);
        };
        match tokio::fs::read(&full).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let Some(full) = self.path_for_url(url) else {
            return Ok(());
        };
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_memory_put_get_delete() {
        let store = MemoryBlobStore::new();
        let url = store
            .put("issued_docs/u1/doc_1_a_Diploma.pdf", Bytes::from_static(b"%PDF"), "application/pdf")
            .await
            .unwrap();
        assert_eq!(url, "memory://issued_docs/u1/doc_1_a_Diploma.pdf");
        assert_eq!(store.get(&url).await.unwrap(), Some(Bytes::from_static(b"%PDF")));
        assert_eq!(store.content_type(&url).as_deref(), Some("application/pdf"));

        store.delete(&url).await.unwrap();
        assert_eq!(store.get(&url).await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_memory_put_never_overwrites() {
        let store = MemoryBlobStore::new();
        let url = store
            .put("a/doc.pdf", Bytes::from_static(b"first"), "application/pdf")
            .await
            .unwrap();

        let err = store
            .put("a/doc.pdf", Bytes::from_static(b"second"), "application/pdf")
            .await;
        assert!(matches!(err, Err(StoreError::BlobExists(ref p)) if p == "a/doc.pdf"));
        assert_eq!(store.get(&url).await.unwrap(), Some(Bytes::from_static(b"first")));

        store.delete(&url).await.unwrap();
        store
            .put("a/doc.pdf", Bytes::from_static(b"second"), "application/pdf")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_fs_put_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path(), "https://cdn.example/blobs").unwrap();
        let url = store
            .put("u1/doc.pdf", Bytes::from_static(b"first"), "application/pdf")
            .await
            .unwrap();

        let err = store
            .put("u1/doc.pdf", Bytes::from_static(b"second"), "application/pdf")
            .await;
        assert!(matches!(err, Err(StoreError::BlobExists(_))));
        assert_eq!(store.get(&url).await.unwrap(), Some(Bytes::from_static(b"first")));
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let store = MemoryBlobStore::new();
        for bad in ["", "../etc/passwd", "/abs/path.pdf", "a/../../b.pdf"] {
            let err = store.put(bad, Bytes::new(), "application/pdf").await;
            assert!(matches!(err, Err(StoreError::BlobRejected(_))), "accepted {bad:?}");
        }
    }

    #[tokio::test]
    async fn test_fs_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path(), "https://cdn.example/blobs/").unwrap();

        let url = store
            .put("issued_docs/u1/doc.pdf", Bytes::from_static(b"stamped"), "application/pdf")
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.example/blobs/issued_docs/u1/doc.pdf");
        assert!(dir.path().join("issued_docs/u1/doc.pdf").exists());

        assert_eq!(store.get(&url).await.unwrap(), Some(Bytes::from_static(b"stamped")));
        assert_eq!(store.get("https://elsewhere/doc.pdf").await.unwrap(), None);

        store.delete(&url).await.unwrap();
        store.delete(&url).await.unwrap();
        assert_eq!(store.get(&url).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fs_file_urls() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open_file_urls(dir.path()).unwrap();

        let url = store
            .put("a/b.pdf", Bytes::from_static(b"x"), "application/pdf")
            .await
            .unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("/a/b.pdf"));
        assert_eq!(store.get(&url).await.unwrap(), Some(Bytes::from_static(b"x")));
    }

    proptest! {
        #[test]
        fn test_relative_paths_accepted(segments in prop::collection::vec("[A-Za-z0-9_.-]{1,12}", 1..5)) {
            prop_assume!(segments.iter().all(|s| s != "." && s != ".."));
            let path = segments.join("/");
            prop_assert!(check_path(&path).is_ok(), "rejected {:?}", path);
        }

        #[test]
        fn test_parent_segments_rejected(
            before in prop::collection::vec("[a-z0-9]{1,8}", 0..3),
            after in prop::collection::vec("[a-z0-9]{1,8}", 0..3),
        ) {
            let mut segments = before;
            segments.push("..".to_string());
            segments.extend(after);
            let path = segments.join("/");
            prop_assert!(check_path(&path).is_err(), "accepted {:?}", path);
            let absolute = format!("/{}", path);
            prop_assert!(check_path(&absolute).is_err());
        }
    }
}
