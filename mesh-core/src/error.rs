//! Core error types

use thiserror::Error;

/// Errors from identity and commitment handling
#[derive(Debug, Error)]
pub enum CoreError {
    /// Signature did not verify against the claimed identity's key
    #[error("Invalid signature for identity {0}")]
    InvalidSignature(String),

    /// No verifying key registered for the identity
    #[error("Unknown identity: {0}")]
    UnknownIdentity(String),

    /// Key or signature material could not be decoded
    #[error("Malformed key material: {0}")]
    MalformedKey(String),
}

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;
