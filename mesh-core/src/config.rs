//! Mesh configuration
//!
//! Supports loading from environment variables with the MESH_ prefix.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Process-wide configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshConfig {
    /// Write credential lifetime in seconds
    #[serde(default = "default_credential_ttl")]
    pub credential_ttl_secs: u64,
    /// Accepted clock skew for access commitments, in seconds
    #[serde(default = "default_commitment_skew")]
    pub commitment_skew_secs: u64,
    /// Records per upload chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size_records: usize,
    /// Maximum put attempts per chunk before the job fails
    #[serde(default = "default_max_put_attempts")]
    pub max_put_attempts: u32,
    /// Initial retry delay in milliseconds
    #[serde(default = "default_retry_delay")]
    pub retry_initial_delay_ms: u64,
    /// Maximum retry delay in milliseconds
    #[serde(default = "default_retry_max_delay")]
    pub retry_max_delay_ms: u64,
    /// Global query fanout timeout in milliseconds
    #[serde(default = "default_query_timeout")]
    pub query_timeout_ms: u64,
}

fn default_credential_ttl() -> u64 {
    3600
}

fn default_commitment_skew() -> u64 {
    300
}

fn default_chunk_size() -> usize {
    500
}

fn default_max_put_attempts() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    200
}

fn default_retry_max_delay() -> u64 {
    5_000
}

fn default_query_timeout() -> u64 {
    3_000
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            credential_ttl_secs: default_credential_ttl(),
            commitment_skew_secs: default_commitment_skew(),
            chunk_size_records: default_chunk_size(),
            max_put_attempts: default_max_put_attempts(),
            retry_initial_delay_ms: default_retry_delay(),
            retry_max_delay_ms: default_retry_max_delay(),
            query_timeout_ms: default_query_timeout(),
        }
    }
}

impl MeshConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - MESH_CREDENTIAL_TTL_SECS: write credential lifetime
    /// - MESH_COMMITMENT_SKEW_SECS: accepted commitment clock skew
    /// - MESH_CHUNK_SIZE_RECORDS: records per upload chunk
    /// - MESH_MAX_PUT_ATTEMPTS: put attempts per chunk
    /// - MESH_RETRY_INITIAL_DELAY_MS: initial retry backoff
    /// - MESH_RETRY_MAX_DELAY_MS: retry backoff cap
    /// - MESH_QUERY_TIMEOUT_MS: fanout deadline
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            credential_ttl_secs: env_u64("MESH_CREDENTIAL_TTL_SECS", defaults.credential_ttl_secs),
            commitment_skew_secs: env_u64(
                "MESH_COMMITMENT_SKEW_SECS",
                defaults.commitment_skew_secs,
            ),
            chunk_size_records: env_u64("MESH_CHUNK_SIZE_RECORDS", defaults.chunk_size_records as u64)
                as usize,
            max_put_attempts: env_u64("MESH_MAX_PUT_ATTEMPTS", defaults.max_put_attempts as u64)
                as u32,
            retry_initial_delay_ms: env_u64(
                "MESH_RETRY_INITIAL_DELAY_MS",
                defaults.retry_initial_delay_ms,
            ),
            retry_max_delay_ms: env_u64("MESH_RETRY_MAX_DELAY_MS", defaults.retry_max_delay_ms),
            query_timeout_ms: env_u64("MESH_QUERY_TIMEOUT_MS", defaults.query_timeout_ms),
        }
    }

    /// Short timeouts for local development and tests
    pub fn development() -> Self {
        Self {
            credential_ttl_secs: 60,
            commitment_skew_secs: 300,
            chunk_size_records: 10,
            max_put_attempts: 3,
            retry_initial_delay_ms: 10,
            retry_max_delay_ms: 100,
            query_timeout_ms: 3_000,
        }
    }

    /// Query timeout as a std Duration
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// Commitment skew window as a chrono Duration
    pub fn commitment_skew(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.commitment_skew_secs as i64)
    }

    /// Credential TTL as a chrono Duration
    pub fn credential_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.credential_ttl_secs as i64)
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MeshConfig::default();
        assert_eq!(config.credential_ttl_secs, 3600);
        assert_eq!(config.commitment_skew_secs, 300);
        assert_eq!(config.max_put_attempts, 3);
    }

    #[test]
    fn test_development_preset() {
        let config = MeshConfig::development();
        assert!(config.retry_initial_delay_ms < MeshConfig::default().retry_initial_delay_ms);
        assert_eq!(config.query_timeout().as_millis(), 3_000);
    }
}
