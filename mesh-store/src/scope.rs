//! Identity and key scoping
//!
//! Every store operation is confined to one identity's prefix. Keys are
//! validated before touching any backend so that a crafted key can never
//! resolve to a path outside the prefix.

use crate::error::{StoreError, StoreResult};

/// Storage key for a chunk within a job
pub fn chunk_key(job_id: &str, chunk_index: u32) -> String {
    format!("{}/chunk-{:06}", job_id, chunk_index)
}

/// Validate an identity string: non-empty, `[A-Za-z0-9_-]` only
pub fn validate_identity(identity: &str) -> StoreResult<()> {
    if identity.is_empty() {
        return Err(StoreError::ScopeViolation("empty identity".to_string()));
    }
    if !identity
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(StoreError::ScopeViolation(format!(
            "identity contains illegal characters: {}",
            identity
        )));
    }
    Ok(())
}

/// Validate a storage key against traversal and absolute-path tricks
pub fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::ScopeViolation("empty key".to_string()));
    }
    if key.starts_with('/') || key.starts_with('\\') || key.contains('\\') {
        return Err(StoreError::ScopeViolation(format!(
            "absolute or backslash key: {}",
            key
        )));
    }
    if key.contains('\0') {
        return Err(StoreError::ScopeViolation("NUL byte in key".to_string()));
    }
    for segment in key.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(StoreError::ScopeViolation(format!(
                "illegal key segment in: {}",
                key
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_key_format() {
        assert_eq!(chunk_key("job-1", 0), "job-1/chunk-000000");
        assert_eq!(chunk_key("job-1", 42), "job-1/chunk-000042");
    }

    #[test]
    fn test_identity_validation() {
        assert!(validate_identity("producer-1").is_ok());
        assert!(validate_identity("p_2").is_ok());
        assert!(validate_identity("").is_err());
        assert!(validate_identity("../escape").is_err());
        assert!(validate_identity("a/b").is_err());
    }

    #[test]
    fn test_key_traversal_rejected() {
        assert!(validate_key("job-1/chunk-000000").is_ok());
        assert!(validate_key("../other-identity/chunk-000000").is_err());
        assert!(validate_key("job-1/../../secret").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("job-1//chunk").is_err());
        assert!(validate_key("job-1/./chunk").is_err());
        assert!(validate_key("job\\chunk").is_err());
    }
}
