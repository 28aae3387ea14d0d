//! In-memory object store backend

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::backend::{ObjectEntry, ObjectStore};
use crate::error::{StoreError, StoreResult};
use crate::scope::{validate_identity, validate_key};

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    modified_at: DateTime<Utc>,
}

/// In-memory object store
///
/// Backs tests and single-process deployments. Each identity maps to its
/// own key space, so scope isolation holds by construction.
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, HashMap<String, StoredObject>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects stored under an identity
    pub async fn object_count(&self, identity: &str) -> usize {
        self.objects
            .read()
            .await
            .get(identity)
            .map(|m| m.len())
            .unwrap_or(0)
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, identity: &str, key: &str, bytes: &[u8]) -> StoreResult<()> {
        validate_identity(identity)?;
        validate_key(key)?;
        let mut objects = self.objects.write().await;
        objects.entry(identity.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                bytes: bytes.to_vec(),
                modified_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn list(&self, identity: &str) -> StoreResult<Vec<ObjectEntry>> {
        validate_identity(identity)?;
        let objects = self.objects.read().await;
        let mut entries: Vec<ObjectEntry> = objects
            .get(identity)
            .map(|m| {
                m.iter()
                    .map(|(key, obj)| ObjectEntry {
                        key: key.clone(),
                        size: obj.bytes.len() as u64,
                        modified_at: obj.modified_at,
                    })
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    async fn get(&self, identity: &str, key: &str) -> StoreResult<Vec<u8>> {
        validate_identity(identity)?;
        validate_key(key)?;
        let objects = self.objects.read().await;
        objects
            .get(identity)
            .and_then(|m| m.get(key))
            .map(|obj| obj.bytes.clone())
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", identity, key)))
    }

    async fn provision(&self, identity: &str) -> StoreResult<()> {
        validate_identity(identity)?;
        self.objects
            .write()
            .await
            .entry(identity.to_string())
            .or_default();
        Ok(())
    }
}
