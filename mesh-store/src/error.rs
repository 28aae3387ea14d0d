//! Store and credential error types

use thiserror::Error;

/// Object store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Object not found; a valid terminal state for readers
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Key or identity escapes the identity prefix
    #[error("Scope violation: {0}")]
    ScopeViolation(String),

    /// Write operation failed
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Read operation failed
    #[error("Read failed: {0}")]
    ReadFailed(String),

    /// Stored content does not match its recorded checksum
    #[error("Integrity check failed: {0}")]
    IntegrityFailed(String),

    /// Transient backend failure; safe to retry
    #[error("Transient storage error: {0}")]
    Transient(String),
}

impl StoreError {
    /// Whether a retry at the pipeline layer is worthwhile
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::WriteFailed(_))
    }
}

/// Store result type
pub type StoreResult<T> = Result<T, StoreError>;

/// Credential issuance and validation errors
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Commitment signature did not verify
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Commitment timestamp outside the skew window
    #[error("Stale commitment: age {age_secs}s exceeds skew window {skew_secs}s")]
    StaleCommitment { age_secs: i64, skew_secs: i64 },

    /// No key registered for the identity
    #[error("Unknown identity: {0}")]
    UnknownIdentity(String),

    /// Credential past its expiry
    #[error("Credential expired at {0}")]
    Expired(chrono::DateTime<chrono::Utc>),

    /// Secret not issued by this issuer, or scope mismatch
    #[error("Credential not recognized for identity {0}")]
    NotIssued(String),

    /// Underlying store failure while provisioning
    #[error("Provisioning failed: {0}")]
    Provisioning(#[from] StoreError),
}

/// Credential result type
pub type CredentialResult<T> = Result<T, CredentialError>;
