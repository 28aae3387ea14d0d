//! Object store backends
//!
//! The interface is backend-agnostic; the in-memory backend serves tests
//! and single-process deployments, the local backend persists to disk.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreResult;

pub mod local;
pub mod memory;

/// A committed object under an identity prefix
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ObjectEntry {
    /// Key relative to the identity prefix
    pub key: String,
    /// Object size in bytes
    pub size: u64,
    /// Last write time
    pub modified_at: DateTime<Utc>,
}

/// Partitioned object store
///
/// All operations are scoped strictly to the `identity` prefix; crafted
/// keys that would escape the prefix are rejected before reaching the
/// backend. `put` is idempotent: rewriting a key overwrites, so a producer
/// may retry after an ambiguous failure without creating duplicates.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write an object; per-key atomic, overwrites on repeat
    async fn put(&self, identity: &str, key: &str, bytes: &[u8]) -> StoreResult<()>;

    /// List committed objects under the identity prefix
    ///
    /// An identity with no objects yields an empty list, not an error.
    async fn list(&self, identity: &str) -> StoreResult<Vec<ObjectEntry>>;

    /// Read an object's bytes
    async fn get(&self, identity: &str, key: &str) -> StoreResult<Vec<u8>>;

    /// Ensure the identity prefix exists (lazy provisioning)
    async fn provision(&self, identity: &str) -> StoreResult<()>;
}
