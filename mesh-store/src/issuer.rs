//! Credential issuer
//!
//! Exchanges signed access commitments for scoped, expiring credentials.
//! A write credential confines its holder to the holder's own identity
//! prefix; a read grant allows discovery and download across any prefix.
//! The issuer remembers what it handed out, so a presented secret can be
//! checked without any shared-key scheme.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mesh_core::{AccessCommitment, KeyRegistry, MeshConfig, PeerId};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::backend::ObjectStore;
use crate::error::{CredentialError, CredentialResult};

/// Scoped write credential
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteCredential {
    /// Identity the credential is bound to
    pub identity: PeerId,
    /// Key prefix writes are confined to
    pub scope_prefix: String,
    /// Opaque bearer secret, presented on every write
    pub secret: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl WriteCredential {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Seconds of validity remaining, clamped at zero
    pub fn remaining_secs(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }
}

/// Read grant for discovery and download
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadGrant {
    /// Identity the grant was issued to
    pub requester: PeerId,
    /// Prefix the requester asked about; `None` covers all prefixes
    pub target: Option<PeerId>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ReadGrant {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Issues and validates credentials against registered peer keys
pub struct CredentialIssuer {
    registry: Arc<KeyRegistry>,
    store: Arc<dyn ObjectStore>,
    ttl: chrono::Duration,
    skew: chrono::Duration,
    active: RwLock<HashMap<String, WriteCredential>>,
}

impl CredentialIssuer {
    pub fn new(registry: Arc<KeyRegistry>, store: Arc<dyn ObjectStore>, config: &MeshConfig) -> Self {
        Self {
            registry,
            store,
            ttl: config.credential_ttl(),
            skew: config.commitment_skew(),
            active: RwLock::new(HashMap::new()),
        }
    }

    fn check_commitment(&self, commitment: &AccessCommitment) -> CredentialResult<()> {
        if !commitment.is_fresh(self.skew) {
            return Err(CredentialError::StaleCommitment {
                age_secs: commitment.age_seconds(),
                skew_secs: self.skew.num_seconds(),
            });
        }
        commitment.verify(&self.registry).map_err(|e| match e {
            mesh_core::CoreError::UnknownIdentity(id) => CredentialError::UnknownIdentity(id),
            other => CredentialError::InvalidSignature(other.to_string()),
        })
    }

    /// Exchange a fresh, signed commitment for a write credential
    ///
    /// Provisions the identity's storage prefix if it does not yet exist.
    pub async fn issue_write(
        &self,
        commitment: &AccessCommitment,
    ) -> CredentialResult<WriteCredential> {
        self.check_commitment(commitment)?;

        self.store.provision(commitment.identity.0.as_str()).await?;

        let now = Utc::now();
        let credential = WriteCredential {
            identity: commitment.identity.clone(),
            scope_prefix: format!("{}/", commitment.identity.0),
            secret: generate_secret(),
            issued_at: now,
            expires_at: now + self.ttl,
        };

        self.active
            .write()
            .await
            .insert(credential.secret.clone(), credential.clone());

        info!(
            identity = %credential.identity,
            expires_at = %credential.expires_at,
            "write credential issued"
        );
        Ok(credential)
    }

    /// Exchange a fresh, signed commitment for a read grant
    ///
    /// Any registered identity may read any prefix; the commitment only
    /// authenticates the requester.
    pub async fn issue_read(&self, commitment: &AccessCommitment) -> CredentialResult<ReadGrant> {
        self.check_commitment(commitment)?;

        let now = Utc::now();
        let grant = ReadGrant {
            requester: commitment.identity.clone(),
            target: commitment.counterparty.clone(),
            issued_at: now,
            expires_at: now + self.ttl,
        };
        info!(requester = %grant.requester, target = ?grant.target, "read grant issued");
        Ok(grant)
    }

    /// Check a presented write secret against the identity it claims
    pub async fn validate_write_secret(
        &self,
        identity: &str,
        secret: &str,
    ) -> CredentialResult<()> {
        let active = self.active.read().await;
        let credential = active
            .get(secret)
            .ok_or_else(|| CredentialError::NotIssued(identity.to_string()))?;
        if credential.identity.0 != identity {
            warn!(
                claimed = %identity,
                bound = %credential.identity,
                "write secret presented for wrong identity"
            );
            return Err(CredentialError::NotIssued(identity.to_string()));
        }
        if credential.is_expired() {
            return Err(CredentialError::Expired(credential.expires_at));
        }
        Ok(())
    }

    /// Drop expired credentials from the active set
    pub async fn purge_expired(&self) -> usize {
        let mut active = self.active.write().await;
        let before = active.len();
        active.retain(|_, c| !c.is_expired());
        before - active.len()
    }
}

fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryObjectStore;
    use mesh_core::PeerKeypair;

    fn setup() -> (PeerKeypair, CredentialIssuer, Arc<MemoryObjectStore>) {
        let keypair = PeerKeypair::generate(PeerId("producer-1".to_string()));
        let mut registry = KeyRegistry::new();
        registry.register_keypair(&keypair);
        let store = Arc::new(MemoryObjectStore::new());
        let issuer = CredentialIssuer::new(
            Arc::new(registry),
            store.clone(),
            &MeshConfig::default(),
        );
        (keypair, issuer, store)
    }

    #[tokio::test]
    async fn test_issue_and_validate_write() {
        let (keypair, issuer, _store) = setup();
        let commitment = AccessCommitment::sign(&keypair, None);
        let credential = issuer.issue_write(&commitment).await.unwrap();

        assert_eq!(credential.scope_prefix, "producer-1/");
        assert!(!credential.is_expired());
        issuer
            .validate_write_secret("producer-1", &credential.secret)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_secret_bound_to_identity() {
        let (keypair, issuer, _store) = setup();
        let commitment = AccessCommitment::sign(&keypair, None);
        let credential = issuer.issue_write(&commitment).await.unwrap();

        let err = issuer
            .validate_write_secret("producer-2", &credential.secret)
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::NotIssued(_)));
    }

    #[tokio::test]
    async fn test_unknown_secret_rejected() {
        let (_keypair, issuer, _store) = setup();
        let err = issuer
            .validate_write_secret("producer-1", "deadbeef")
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::NotIssued(_)));
    }

    #[tokio::test]
    async fn test_stale_commitment_rejected() {
        let (keypair, issuer, _store) = setup();
        let mut commitment = AccessCommitment::sign(&keypair, None);
        commitment.timestamp = Utc::now() - chrono::Duration::seconds(600);

        let err = issuer.issue_write(&commitment).await.unwrap_err();
        assert!(matches!(err, CredentialError::StaleCommitment { .. }));
    }

    #[tokio::test]
    async fn test_unregistered_identity_rejected() {
        let (_keypair, issuer, _store) = setup();
        let stranger = PeerKeypair::generate(PeerId("stranger".to_string()));
        let commitment = AccessCommitment::sign(&stranger, None);

        let err = issuer.issue_write(&commitment).await.unwrap_err();
        assert!(matches!(err, CredentialError::UnknownIdentity(_)));
    }

    #[tokio::test]
    async fn test_issue_write_provisions_prefix() {
        let (keypair, issuer, store) = setup();
        let commitment = AccessCommitment::sign(&keypair, None);
        issuer.issue_write(&commitment).await.unwrap();
        assert!(store.list("producer-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_grant_for_any_registered_peer() {
        let (keypair, issuer, _store) = setup();
        let commitment = AccessCommitment::sign(&keypair, None);
        let grant = issuer.issue_read(&commitment).await.unwrap();
        assert_eq!(grant.requester, PeerId("producer-1".to_string()));
        assert!(!grant.is_expired());
    }
}
