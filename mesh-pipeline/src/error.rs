//! Pipeline error types

use thiserror::Error;

/// Upload and download pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A chunk exhausted its retry budget; the job stops, others continue
    #[error("Job {job_id} failed after {attempts} attempts: {reason}")]
    JobFailed {
        job_id: String,
        attempts: u32,
        reason: String,
    },

    /// Invalid state transition for a job
    #[error("Invalid job transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Credential error: {0}")]
    Credential(#[from] mesh_store::CredentialError),

    #[error("Store error: {0}")]
    Store(#[from] mesh_store::StoreError),

    #[error("Checkpoint I/O failed: {0}")]
    Checkpoint(#[from] std::io::Error),

    #[error("Chunk encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Pipeline result type
pub type PipelineResult<T> = Result<T, PipelineError>;
