//! Wire types for the store node API

use mesh_core::AccessCommitment;
use mesh_store::ObjectEntry;
use serde::{Deserialize, Serialize};

/// Credential request body: a signed commitment, flat on the wire
/// (`{identity, counterparty?, timestamp, signature}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRequest {
    #[serde(flatten)]
    pub commitment: AccessCommitment,
}

/// Listing of committed objects under an identity prefix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectListResponse {
    pub identity: String,
    pub objects: Vec<ObjectEntry>,
}

/// Acknowledgement of a committed chunk write
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutResponse {
    pub key: String,
    pub size: u64,
}

/// Health probe response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
