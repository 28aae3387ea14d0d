//! Durable upload checkpoints
//!
//! A checkpoint records the highest chunk index the remote store has
//! acknowledged. It is written only after that acknowledgement, so the
//! checkpoint never claims more progress than the store holds. A resumed
//! job re-reads it and skips everything at or below the recorded index.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PipelineResult;

/// Progress marker for one upload job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadCheckpoint {
    pub job_id: String,
    /// Highest committed chunk index; `None` before the first commit
    pub last_committed_chunk_index: Option<u32>,
    /// Records covered by committed chunks
    pub total_records_processed: u64,
    pub last_processed_time: DateTime<Utc>,
}

impl UploadCheckpoint {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            last_committed_chunk_index: None,
            total_records_processed: 0,
            last_processed_time: Utc::now(),
        }
    }

    /// Record a committed chunk
    pub fn advance(&mut self, chunk_index: u32, records_in_chunk: u64) {
        self.last_committed_chunk_index = Some(chunk_index);
        self.total_records_processed += records_in_chunk;
        self.last_processed_time = Utc::now();
    }

    /// Whether `chunk_index` is already covered
    pub fn covers(&self, chunk_index: u32) -> bool {
        self.last_committed_chunk_index
            .map(|last| chunk_index <= last)
            .unwrap_or(false)
    }

    /// Index of the next chunk to send
    pub fn next_chunk_index(&self) -> u32 {
        self.last_committed_chunk_index
            .map(|last| last + 1)
            .unwrap_or(0)
    }
}

/// Filesystem-backed checkpoint storage, one JSON file per job
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, job_id: &str) -> PathBuf {
        self.dir.join(format!("{}.checkpoint.json", job_id))
    }

    /// Load a job's checkpoint; `None` when the job has never committed
    pub async fn load(&self, job_id: &str) -> PipelineResult<Option<UploadCheckpoint>> {
        let path = self.path_for(job_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Persist a checkpoint durably (temp file then rename)
    pub async fn save(&self, checkpoint: &UploadCheckpoint) -> PipelineResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(&checkpoint.job_id);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(checkpoint)?;
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(
            job_id = %checkpoint.job_id,
            chunk = ?checkpoint.last_committed_chunk_index,
            "checkpoint saved"
        );
        Ok(())
    }

    /// Remove a completed job's checkpoint
    pub async fn remove(&self, job_id: &str) -> PipelineResult<()> {
        let path = self.path_for(job_id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// List job ids with saved checkpoints
    pub async fn list_jobs(&self) -> PipelineResult<Vec<String>> {
        let mut jobs = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(jobs),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(job_id) = name.strip_suffix(".checkpoint.json") {
                jobs.push(job_id.to_string());
            }
        }
        jobs.sort();
        Ok(jobs)
    }
}

/// Resolve the checkpoint directory default
pub fn default_checkpoint_dir() -> PathBuf {
    Path::new(".mesh").join("checkpoints")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        assert!(store.load("job-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());

        let mut checkpoint = UploadCheckpoint::new("job-1");
        checkpoint.advance(0, 500);
        checkpoint.advance(1, 500);
        store.save(&checkpoint).await.unwrap();

        let loaded = store.load("job-1").await.unwrap().unwrap();
        assert_eq!(loaded.last_committed_chunk_index, Some(1));
        assert_eq!(loaded.total_records_processed, 1000);
        assert_eq!(loaded.next_chunk_index(), 2);
    }

    #[tokio::test]
    async fn test_fresh_checkpoint_covers_nothing() {
        let checkpoint = UploadCheckpoint::new("job-1");
        assert!(!checkpoint.covers(0));
        assert_eq!(checkpoint.next_chunk_index(), 0);

        let mut advanced = checkpoint.clone();
        advanced.advance(0, 10);
        assert!(advanced.covers(0));
        assert!(!advanced.covers(1));
    }

    #[tokio::test]
    async fn test_remove_and_list() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());

        store.save(&UploadCheckpoint::new("job-a")).await.unwrap();
        store.save(&UploadCheckpoint::new("job-b")).await.unwrap();
        assert_eq!(store.list_jobs().await.unwrap(), vec!["job-a", "job-b"]);

        store.remove("job-a").await.unwrap();
        assert_eq!(store.list_jobs().await.unwrap(), vec!["job-b"]);

        // Removing twice is fine
        store.remove("job-a").await.unwrap();
    }
}
