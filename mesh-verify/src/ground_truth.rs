//! Ground truth lookup
//!
//! Abstracts "re-fetch the item from its source". The in-memory
//! implementation backs tests and simulations.

use std::collections::HashMap;

use async_trait::async_trait;
use mesh_core::ListingPayload;
use tokio::sync::RwLock;

/// Source-of-truth lookup by record uri
#[async_trait]
pub trait GroundTruth: Send + Sync {
    /// Current state of the item; `None` when the source dropped it
    async fn lookup(&self, uri: &str) -> Option<ListingPayload>;
}

/// In-memory ground truth table
pub struct InMemoryGroundTruth {
    items: RwLock<HashMap<String, ListingPayload>>,
}

impl InMemoryGroundTruth {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }

    /// Set the current state of an item
    pub async fn insert(&self, uri: impl Into<String>, payload: ListingPayload) {
        self.items.write().await.insert(uri.into(), payload);
    }

    /// Drop an item, as if the source removed it
    pub async fn remove(&self, uri: &str) {
        self.items.write().await.remove(uri);
    }
}

impl Default for InMemoryGroundTruth {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GroundTruth for InMemoryGroundTruth {
    async fn lookup(&self, uri: &str) -> Option<ListingPayload> {
        self.items.read().await.get(uri).cloned()
    }
}
