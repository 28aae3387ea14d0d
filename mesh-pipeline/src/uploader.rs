//! Producer upload pipeline
//!
//! Splits a dataset into fixed-size chunks and writes them through a
//! scoped credential, checkpointing after every acknowledged write. A
//! chunk is retried with backoff on retryable failures; once the budget
//! is spent the job fails, leaving its checkpoint for a later resume.

use std::sync::Arc;

use mesh_core::{AccessCommitment, MeshConfig, PeerKeypair, Record};
use mesh_store::{chunk_key, CredentialIssuer, ObjectStore, WriteCredential};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::checkpoint::{CheckpointStore, UploadCheckpoint};
use crate::chunk::encode_chunk;
use crate::error::{PipelineError, PipelineResult};
use crate::job::{JobState, UploadJob};
use crate::retry::RetryStrategy;

/// Summary of one finished upload job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub job_id: String,
    pub chunks_sent: u32,
    /// Chunks skipped because a checkpoint already covered them
    pub chunks_skipped: u32,
    pub records_uploaded: u64,
}

/// Chunked, checkpointed uploader for one producer identity
pub struct UploadPipeline {
    store: Arc<dyn ObjectStore>,
    issuer: Arc<CredentialIssuer>,
    keypair: PeerKeypair,
    checkpoints: CheckpointStore,
    chunk_size: usize,
    max_attempts: u32,
    strategy: RetryStrategy,
    credential: RwLock<Option<WriteCredential>>,
}

impl UploadPipeline {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        issuer: Arc<CredentialIssuer>,
        keypair: PeerKeypair,
        checkpoints: CheckpointStore,
        config: &MeshConfig,
    ) -> Self {
        Self {
            store,
            issuer,
            keypair,
            checkpoints,
            chunk_size: config.chunk_size_records,
            max_attempts: config.max_put_attempts,
            strategy: RetryStrategy::from_config(config),
            credential: RwLock::new(None),
        }
    }

    /// Override the retry strategy
    pub fn with_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Current credential, refreshed when expired
    async fn credential(&self) -> PipelineResult<WriteCredential> {
        {
            let guard = self.credential.read().await;
            if let Some(credential) = guard.as_ref() {
                if !credential.is_expired() {
                    return Ok(credential.clone());
                }
            }
        }

        let commitment = AccessCommitment::sign(&self.keypair, None);
        let fresh = self.issuer.issue_write(&commitment).await?;
        debug!(identity = %fresh.identity, "refreshed write credential");
        *self.credential.write().await = Some(fresh.clone());
        Ok(fresh)
    }

    /// Upload one job, resuming from its checkpoint if one exists
    pub async fn upload(&self, job_id: &str, records: &[Record]) -> PipelineResult<UploadOutcome> {
        let mut checkpoint = match self.checkpoints.load(job_id).await? {
            Some(checkpoint) => {
                info!(
                    job_id = %job_id,
                    resume_from = checkpoint.next_chunk_index(),
                    "resuming upload from checkpoint"
                );
                checkpoint
            }
            None => UploadCheckpoint::new(job_id),
        };

        let mut job = UploadJob::new(job_id);
        job.transition(JobState::InProgress)?;

        let mut chunks_sent = 0u32;
        let mut chunks_skipped = 0u32;
        let mut records_uploaded = 0u64;

        for (index, batch) in records.chunks(self.chunk_size).enumerate() {
            let index = index as u32;
            if checkpoint.covers(index) {
                chunks_skipped += 1;
                continue;
            }

            let bytes = encode_chunk(batch)?;
            self.put_with_retry(job_id, index, &bytes, &mut job).await?;

            // Checkpoint only after the store acknowledged the write
            checkpoint.advance(index, batch.len() as u64);
            self.checkpoints.save(&checkpoint).await?;

            chunks_sent += 1;
            records_uploaded += batch.len() as u64;
        }

        job.transition(JobState::Complete)?;
        info!(
            job_id = %job_id,
            chunks_sent,
            chunks_skipped,
            records_uploaded,
            "upload complete"
        );
        Ok(UploadOutcome {
            job_id: job_id.to_string(),
            chunks_sent,
            chunks_skipped,
            records_uploaded,
        })
    }

    /// Upload several jobs concurrently; one job's failure or backoff
    /// never stops or delays the others
    pub async fn upload_many(
        self: &Arc<Self>,
        jobs: Vec<(String, Vec<Record>)>,
    ) -> Vec<(String, PipelineResult<UploadOutcome>)> {
        let handles: Vec<_> = jobs
            .into_iter()
            .map(|(job_id, records)| {
                let pipeline = Arc::clone(self);
                let task_id = job_id.clone();
                let handle =
                    tokio::spawn(async move { pipeline.upload(&task_id, &records).await });
                (job_id, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (job_id, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(join_error) => Err(PipelineError::JobFailed {
                    job_id: job_id.clone(),
                    attempts: 0,
                    reason: join_error.to_string(),
                }),
            };
            if let Err(e) = &result {
                warn!(job_id = %job_id, error = %e, "upload job failed, continuing with remaining jobs");
            }
            results.push((job_id, result));
        }
        results
    }

    async fn put_with_retry(
        &self,
        job_id: &str,
        chunk_index: u32,
        bytes: &[u8],
        job: &mut UploadJob,
    ) -> PipelineResult<()> {
        let key = chunk_key(job_id, chunk_index);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let credential = self.credential().await?;
            match self
                .store
                .put(credential.identity.as_str(), &key, bytes)
                .await
            {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.strategy.delay_for_attempt(attempt);
                    warn!(
                        job_id = %job_id,
                        chunk = chunk_index,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "chunk write failed, backing off"
                    );
                    job.last_error = Some(e.to_string());
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    job.last_error = Some(e.to_string());
                    job.transition(JobState::Failed)?;
                    return Err(PipelineError::JobFailed {
                        job_id: job_id.to_string(),
                        attempts: attempt,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
}
