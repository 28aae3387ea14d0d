//! HTTP client for producer and verifier processes

use mesh_core::{AccessCommitment, PeerKeypair};
use mesh_store::{ObjectEntry, ReadGrant, WriteCredential};
use thiserror::Error;
use tracing::debug;

use crate::dto::{CredentialRequest, ObjectListResponse, PutResponse};
use crate::routes::SECRET_HEADER;

/// Client-side errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Client result type
pub type ClientResult<T> = Result<T, ClientError>;

/// Client for one store node
#[derive(Clone)]
pub struct MeshApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl MeshApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    async fn check(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(ClientError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    /// Request a write credential by signing a fresh commitment
    pub async fn request_write_credential(
        &self,
        keypair: &PeerKeypair,
    ) -> ClientResult<WriteCredential> {
        let request = CredentialRequest {
            commitment: AccessCommitment::sign(keypair, None),
        };
        let response = self
            .http
            .post(format!("{}/api/v1/credentials/write", self.base_url))
            .json(&request)
            .send()
            .await?;
        let credential: WriteCredential = Self::check(response).await?.json().await?;
        debug!(identity = %credential.identity, "write credential obtained");
        Ok(credential)
    }

    /// Request a read grant by signing a fresh commitment
    pub async fn request_read_grant(&self, keypair: &PeerKeypair) -> ClientResult<ReadGrant> {
        let request = CredentialRequest {
            commitment: AccessCommitment::sign(keypair, None),
        };
        let response = self
            .http
            .post(format!("{}/api/v1/credentials/read", self.base_url))
            .json(&request)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Upload one chunk under the holder's identity prefix
    pub async fn put_object(
        &self,
        credential: &WriteCredential,
        key: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<PutResponse> {
        let response = self
            .http
            .put(format!(
                "{}/objects/{}/{}",
                self.base_url, credential.identity, key
            ))
            .header(SECRET_HEADER, &credential.secret)
            .body(bytes)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// List committed objects under an identity prefix
    pub async fn list_objects(&self, identity: &str) -> ClientResult<Vec<ObjectEntry>> {
        let response = self
            .http
            .get(format!("{}/objects/{}", self.base_url, identity))
            .send()
            .await?;
        let listing: ObjectListResponse = Self::check(response).await?.json().await?;
        Ok(listing.objects)
    }

    /// Fetch one object; `None` when the key does not exist
    pub async fn get_object(&self, identity: &str, key: &str) -> ClientResult<Option<Vec<u8>>> {
        let response = self
            .http
            .get(format!("{}/objects/{}/{}", self.base_url, identity, key))
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let bytes = Self::check(response).await?.bytes().await?;
        Ok(Some(bytes.to_vec()))
    }

    /// Probe node health
    pub async fn health(&self) -> ClientResult<bool> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(response.status().is_success())
    }
}
