//! Query error types

use thiserror::Error;

/// Errors from a producer endpoint
#[derive(Debug, Error)]
pub enum QueryError {
    /// Endpoint refused or failed the query
    #[error("Query rejected: {0}")]
    Rejected(String),

    /// Endpoint task panicked or was cancelled
    #[error("Endpoint task failed: {0}")]
    TaskFailed(String),
}

/// Query result type
pub type QueryOpResult<T> = Result<T, QueryError>;
