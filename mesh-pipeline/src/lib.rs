//! Mesh Pipeline
//!
//! Producer-side upload pipeline and verifier-side download pipeline.
//! Uploads are chunked, retried with bounded backoff, and checkpointed so
//! an interrupted job resumes from the last committed chunk instead of
//! re-sending the whole dataset.

pub mod checkpoint;
pub mod chunk;
pub mod downloader;
pub mod error;
pub mod job;
pub mod retry;
pub mod uploader;

pub use checkpoint::{default_checkpoint_dir, CheckpointStore, UploadCheckpoint};
pub use chunk::{decode_chunk, encode_chunk};
pub use downloader::{DownloadPipeline, DownloadedChunk};
pub use error::{PipelineError, PipelineResult};
pub use job::{JobState, UploadJob};
pub use retry::RetryStrategy;
pub use uploader::{UploadOutcome, UploadPipeline};
