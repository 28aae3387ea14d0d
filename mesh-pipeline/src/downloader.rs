//! Verifier download pipeline
//!
//! Discovers committed chunks under a producer's prefix and pulls them
//! down for re-validation. Discovery never sees half-written objects:
//! only acknowledged chunk writes appear in a listing.

use std::sync::Arc;

use mesh_core::{AccessCommitment, PeerKeypair, Record};
use mesh_store::{CredentialIssuer, ObjectEntry, ObjectStore, ReadGrant, StoreError};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::chunk::decode_chunk;
use crate::error::PipelineResult;

/// One downloaded chunk with its decoded records
#[derive(Debug, Clone)]
pub struct DownloadedChunk {
    pub key: String,
    pub records: Vec<Record>,
}

/// Authenticated reader over producer prefixes
pub struct DownloadPipeline {
    store: Arc<dyn ObjectStore>,
    issuer: Arc<CredentialIssuer>,
    keypair: PeerKeypair,
    grant: RwLock<Option<ReadGrant>>,
}

impl DownloadPipeline {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        issuer: Arc<CredentialIssuer>,
        keypair: PeerKeypair,
    ) -> Self {
        Self {
            store,
            issuer,
            keypair,
            grant: RwLock::new(None),
        }
    }

    /// Current read grant, refreshed when expired
    async fn grant(&self) -> PipelineResult<ReadGrant> {
        {
            let guard = self.grant.read().await;
            if let Some(grant) = guard.as_ref() {
                if !grant.is_expired() {
                    return Ok(grant.clone());
                }
            }
        }

        let commitment = AccessCommitment::sign(&self.keypair, None);
        let fresh = self.issuer.issue_read(&commitment).await?;
        debug!(requester = %fresh.requester, "refreshed read grant");
        *self.grant.write().await = Some(fresh.clone());
        Ok(fresh)
    }

    /// List committed chunks under a producer's prefix, in key order
    pub async fn discover(&self, producer: &str) -> PipelineResult<Vec<ObjectEntry>> {
        self.grant().await?;
        let entries = self.store.list(producer).await?;
        debug!(producer = %producer, chunks = entries.len(), "discovered chunks");
        Ok(entries)
    }

    /// Fetch one chunk's raw bytes; `None` when the key does not exist
    pub async fn fetch(&self, producer: &str, key: &str) -> PipelineResult<Option<Vec<u8>>> {
        self.grant().await?;
        match self.store.get(producer, key).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Download and decode every chunk of one job, in chunk order
    pub async fn download_job(
        &self,
        producer: &str,
        job_id: &str,
    ) -> PipelineResult<Vec<DownloadedChunk>> {
        let prefix = format!("{}/", job_id);
        let entries = self.discover(producer).await?;

        let mut chunks = Vec::new();
        for entry in entries.into_iter().filter(|e| e.key.starts_with(&prefix)) {
            if let Some(bytes) = self.fetch(producer, &entry.key).await? {
                chunks.push(DownloadedChunk {
                    key: entry.key,
                    records: decode_chunk(&bytes)?,
                });
            }
        }

        let total: usize = chunks.iter().map(|c| c.records.len()).sum();
        info!(producer = %producer, job_id = %job_id, chunks = chunks.len(), records = total, "job downloaded");
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::CheckpointStore;
    use crate::uploader::UploadPipeline;
    use chrono::Utc;
    use mesh_core::{KeyRegistry, MeshConfig, PeerId, RecordSource};
    use mesh_store::MemoryObjectStore;
    use tempfile::TempDir;

    fn records(count: usize) -> Vec<Record> {
        (0..count)
            .map(|i| {
                Record::new(
                    format!("portal:listing-{}", i),
                    RecordSource::Portal,
                    None,
                    format!("payload {}", i).into_bytes(),
                    Utc::now(),
                )
            })
            .collect()
    }

    async fn upload_fixture(
        store: Arc<MemoryObjectStore>,
        registry: &mut KeyRegistry,
        data: &[Record],
    ) -> Arc<CredentialIssuer> {
        let producer = PeerKeypair::generate(PeerId::new("producer-1"));
        registry.register_keypair(&producer);

        // Local issuer pre-registration so the producer can upload
        let issuer = Arc::new(CredentialIssuer::new(
            Arc::new(registry.clone()),
            store.clone(),
            &MeshConfig::default(),
        ));
        let dir = TempDir::new().unwrap();
        let config = MeshConfig {
            chunk_size_records: 10,
            ..MeshConfig::default()
        };
        let uploader = UploadPipeline::new(
            store,
            issuer.clone(),
            producer,
            CheckpointStore::new(dir.path()),
            &config,
        );
        uploader.upload("job-1", data).await.unwrap();
        issuer
    }

    #[tokio::test]
    async fn test_discover_and_download_roundtrip() {
        let store = Arc::new(MemoryObjectStore::new());
        let verifier = PeerKeypair::generate(PeerId::new("verifier-1"));
        let mut registry = KeyRegistry::new();
        registry.register_keypair(&verifier);

        let data = records(25);
        upload_fixture(store.clone(), &mut registry, &data).await;

        let issuer = Arc::new(CredentialIssuer::new(
            Arc::new(registry),
            store.clone(),
            &MeshConfig::default(),
        ));
        let downloader = DownloadPipeline::new(store, issuer, verifier);

        let entries = downloader.discover("producer-1").await.unwrap();
        assert_eq!(entries.len(), 3);

        let chunks = downloader.download_job("producer-1", "job-1").await.unwrap();
        let downloaded: Vec<Record> = chunks.into_iter().flat_map(|c| c.records).collect();
        assert_eq!(downloaded, data);
    }

    #[tokio::test]
    async fn test_fetch_missing_chunk_is_none() {
        let store = Arc::new(MemoryObjectStore::new());
        let verifier = PeerKeypair::generate(PeerId::new("verifier-1"));
        let mut registry = KeyRegistry::new();
        registry.register_keypair(&verifier);

        let issuer = Arc::new(CredentialIssuer::new(
            Arc::new(registry),
            store.clone(),
            &MeshConfig::default(),
        ));
        store.provision("producer-1").await.unwrap();
        let downloader = DownloadPipeline::new(store, issuer, verifier);

        let bytes = downloader
            .fetch("producer-1", "job-1/chunk-000042")
            .await
            .unwrap();
        assert!(bytes.is_none());
    }
}
