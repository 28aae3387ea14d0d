//! Local filesystem object store backend
//!
//! Objects live under `<root>/<identity>/<key>`. Writes go to a temp file
//! first and are renamed into place, so a crashed write never leaves a
//! partial object visible. Each object carries a metadata sidecar holding
//! its checksum, verified on every read.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mesh_core::Digest;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backend::{ObjectEntry, ObjectStore};
use crate::error::{StoreError, StoreResult};
use crate::scope::{validate_identity, validate_key};

const META_SUFFIX: &str = ".meta.json";
const TMP_SUFFIX: &str = ".tmp";

#[derive(Debug, Serialize, Deserialize)]
struct ObjectMeta {
    checksum: String,
    size: u64,
    modified_at: DateTime<Utc>,
}

/// Filesystem-backed object store
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, identity: &str, key: &str) -> PathBuf {
        let mut path = self.root.join(identity);
        for segment in key.split('/') {
            path.push(segment);
        }
        path
    }

    fn meta_path(object_path: &Path) -> PathBuf {
        let mut name = object_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        name.push_str(META_SUFFIX);
        object_path.with_file_name(name)
    }

    async fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
        let mut tmp_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        tmp_name.push_str(TMP_SUFFIX);
        let tmp = path.with_file_name(tmp_name);
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| StoreError::WriteFailed(format!("{}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| StoreError::WriteFailed(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }

    async fn read_entry(&self, identity: &str, key: String) -> StoreResult<ObjectEntry> {
        let object_path = self.object_path(identity, &key);
        let meta_bytes = tokio::fs::read(Self::meta_path(&object_path))
            .await
            .map_err(|e| StoreError::ReadFailed(format!("{}: {}", key, e)))?;
        let meta: ObjectMeta = serde_json::from_slice(&meta_bytes)
            .map_err(|e| StoreError::ReadFailed(format!("corrupt metadata for {}: {}", key, e)))?;
        Ok(ObjectEntry {
            key,
            size: meta.size,
            modified_at: meta.modified_at,
        })
    }

    async fn collect_keys(dir: &Path, prefix: &str, keys: &mut Vec<String>) -> StoreResult<()> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(StoreError::ReadFailed(format!("{}: {}", dir.display(), e)))
            }
        };
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::ReadFailed(format!("{}: {}", dir.display(), e)))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let child_key = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", prefix, name)
            };
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| StoreError::ReadFailed(format!("{}: {}", child_key, e)))?;
            if file_type.is_dir() {
                Box::pin(Self::collect_keys(&entry.path(), &child_key, keys)).await?;
            } else if !name.ends_with(META_SUFFIX) && !name.ends_with(TMP_SUFFIX) {
                keys.push(child_key);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, identity: &str, key: &str, bytes: &[u8]) -> StoreResult<()> {
        validate_identity(identity)?;
        validate_key(key)?;

        let object_path = self.object_path(identity, key);
        if let Some(parent) = object_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::WriteFailed(format!("{}: {}", parent.display(), e)))?;
        }

        Self::write_atomic(&object_path, bytes).await?;

        let meta = ObjectMeta {
            checksum: Digest::sha256(bytes).to_hex(),
            size: bytes.len() as u64,
            modified_at: Utc::now(),
        };
        let meta_bytes = serde_json::to_vec(&meta)
            .map_err(|e| StoreError::WriteFailed(format!("metadata for {}: {}", key, e)))?;
        Self::write_atomic(&Self::meta_path(&object_path), &meta_bytes).await?;

        debug!(identity = %identity, key = %key, size = bytes.len(), "object written");
        Ok(())
    }

    async fn list(&self, identity: &str) -> StoreResult<Vec<ObjectEntry>> {
        validate_identity(identity)?;
        let mut keys = Vec::new();
        Self::collect_keys(&self.root.join(identity), "", &mut keys).await?;
        keys.sort();

        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            match self.read_entry(identity, key.clone()).await {
                Ok(entry) => entries.push(entry),
                // Object without a sidecar: a write died between the two
                // renames. Skip it rather than fail the whole listing.
                Err(e) => warn!(identity = %identity, key = %key, error = %e, "skipping unreadable entry"),
            }
        }
        Ok(entries)
    }

    async fn get(&self, identity: &str, key: &str) -> StoreResult<Vec<u8>> {
        validate_identity(identity)?;
        validate_key(key)?;

        let object_path = self.object_path(identity, key);
        let bytes = match tokio::fs::read(&object_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(format!("{}/{}", identity, key)))
            }
            Err(e) => return Err(StoreError::ReadFailed(format!("{}: {}", key, e))),
        };

        let meta_bytes = tokio::fs::read(Self::meta_path(&object_path))
            .await
            .map_err(|e| StoreError::ReadFailed(format!("metadata for {}: {}", key, e)))?;
        let meta: ObjectMeta = serde_json::from_slice(&meta_bytes)
            .map_err(|e| StoreError::ReadFailed(format!("corrupt metadata for {}: {}", key, e)))?;

        let actual = Digest::sha256(&bytes).to_hex();
        if actual != meta.checksum {
            return Err(StoreError::IntegrityFailed(format!(
                "{}/{}: expected {}, got {}",
                identity, key, meta.checksum, actual
            )));
        }
        Ok(bytes)
    }

    async fn provision(&self, identity: &str) -> StoreResult<()> {
        validate_identity(identity)?;
        let dir = self.root.join(identity);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::WriteFailed(format!("{}: {}", dir.display(), e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, LocalObjectStore) {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let (_dir, store) = store();
        store
            .put("producer-1", "job-1/chunk-000000", b"payload bytes")
            .await
            .unwrap();
        let bytes = store.get("producer-1", "job-1/chunk-000000").await.unwrap();
        assert_eq!(bytes, b"payload bytes");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let (_dir, store) = store();
        let err = store.get("producer-1", "nope").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_recurses_and_sorts() {
        let (_dir, store) = store();
        store.put("producer-1", "job-1/chunk-000001", b"bb").await.unwrap();
        store.put("producer-1", "job-1/chunk-000000", b"a").await.unwrap();
        store.put("producer-1", "job-2/chunk-000000", b"ccc").await.unwrap();

        let entries = store.list("producer-1").await.unwrap();
        let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "job-1/chunk-000000",
                "job-1/chunk-000001",
                "job-2/chunk-000000"
            ]
        );
        assert_eq!(entries[2].size, 3);
    }

    #[tokio::test]
    async fn test_list_empty_identity() {
        let (_dir, store) = store();
        assert!(store.list("producer-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupted_object_fails_integrity() {
        let (dir, store) = store();
        store.put("producer-1", "job-1/chunk-000000", b"original").await.unwrap();

        let path = dir
            .path()
            .join("producer-1")
            .join("job-1")
            .join("chunk-000000");
        tokio::fs::write(&path, b"tampered").await.unwrap();

        let err = store.get("producer-1", "job-1/chunk-000000").await.unwrap_err();
        assert!(matches!(err, StoreError::IntegrityFailed(_)));
    }

    #[tokio::test]
    async fn test_overwrite_updates_checksum() {
        let (_dir, store) = store();
        store.put("producer-1", "k", b"one").await.unwrap();
        store.put("producer-1", "k", b"two").await.unwrap();
        assert_eq!(store.get("producer-1", "k").await.unwrap(), b"two");
    }
}
