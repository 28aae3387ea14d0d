//! Peer identity and signed access commitments
//!
//! Ed25519 signing with domain separation, mirroring the credential flow:
//! a peer proves control of its key by signing an access commitment, and
//! the issuer verifies it against a registry of known verifying keys.

use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};

/// Domain separation tags for signing contexts
pub mod domain {
    /// Domain tag for access commitments
    pub const ACCESS_COMMITMENT: &[u8] = b"mesh:AccessCommitment:v1\0";
}

/// Peer identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(pub String);

impl PeerId {
    /// Create a new peer id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Ed25519 key pair bound to a peer identity
#[derive(Clone)]
pub struct PeerKeypair {
    peer_id: PeerId,
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl PeerKeypair {
    /// Generate a fresh random key pair for `peer_id`
    pub fn generate(peer_id: PeerId) -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        Self {
            peer_id,
            signing_key,
            verifying_key,
        }
    }

    /// Create from a hex-encoded 32-byte secret key
    pub fn from_hex(peer_id: PeerId, hex_str: &str) -> CoreResult<Self> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| CoreError::MalformedKey(format!("invalid hex: {}", e)))?;
        if bytes.len() != 32 {
            return Err(CoreError::MalformedKey(format!(
                "expected 32 key bytes, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        let signing_key = SigningKey::from_bytes(&arr);
        let verifying_key = signing_key.verifying_key();
        Ok(Self {
            peer_id,
            signing_key,
            verifying_key,
        })
    }

    /// The peer this key pair belongs to
    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    /// The verifying key for registry entries
    pub fn verifying_key(&self) -> VerifyingKey {
        self.verifying_key
    }

    /// Public key as hex
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.verifying_key.to_bytes())
    }

    /// Secret key as hex, for key files and `from_hex`
    pub fn secret_key_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// Sign a message with domain separation: `domain_tag || message`
    pub fn sign(&self, domain_tag: &[u8], message: &[u8]) -> Vec<u8> {
        let mut input = Vec::with_capacity(domain_tag.len() + message.len());
        input.extend_from_slice(domain_tag);
        input.extend_from_slice(message);
        self.signing_key.sign(&input).to_bytes().to_vec()
    }
}

/// Registry of verifying keys per peer (the opaque "verify" capability)
#[derive(Debug, Clone, Default)]
pub struct KeyRegistry {
    keys: HashMap<PeerId, VerifyingKey>,
}

impl KeyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a peer's verifying key
    pub fn register(&mut self, peer_id: PeerId, key: VerifyingKey) {
        self.keys.insert(peer_id, key);
    }

    /// Register a key pair's public half
    pub fn register_keypair(&mut self, keypair: &PeerKeypair) {
        self.register(keypair.peer_id().clone(), keypair.verifying_key());
    }

    /// Register a hex-encoded verifying key
    pub fn register_hex(&mut self, peer_id: PeerId, hex_str: &str) -> CoreResult<()> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| CoreError::MalformedKey(format!("invalid hex: {}", e)))?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CoreError::MalformedKey(format!("expected 32 key bytes, got {}", bytes.len())))?;
        let key = VerifyingKey::from_bytes(&arr)
            .map_err(|e| CoreError::MalformedKey(e.to_string()))?;
        self.register(peer_id, key);
        Ok(())
    }

    /// Look up a peer's verifying key
    pub fn get(&self, peer_id: &PeerId) -> Option<&VerifyingKey> {
        self.keys.get(peer_id)
    }

    /// Verify a domain-tagged signature for a peer
    pub fn verify(
        &self,
        peer_id: &PeerId,
        domain_tag: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> CoreResult<()> {
        let key = self
            .keys
            .get(peer_id)
            .ok_or_else(|| CoreError::UnknownIdentity(peer_id.to_string()))?;

        let sig_bytes: [u8; 64] = signature
            .try_into()
            .map_err(|_| CoreError::InvalidSignature(peer_id.to_string()))?;
        let signature = Signature::from_bytes(&sig_bytes);

        let mut input = Vec::with_capacity(domain_tag.len() + message.len());
        input.extend_from_slice(domain_tag);
        input.extend_from_slice(message);

        key.verify(&input, &signature)
            .map_err(|_| CoreError::InvalidSignature(peer_id.to_string()))
    }
}

/// Signed proof of identity control at request time
///
/// Accompanies every credential request. The issuer rejects commitments
/// whose timestamp is outside the configured clock-skew window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessCommitment {
    /// Requesting identity
    pub identity: PeerId,
    /// Target identity for cross-identity read requests
    pub counterparty: Option<PeerId>,
    /// When the commitment was signed
    pub timestamp: DateTime<Utc>,
    /// Signature over the canonical commitment message (hex)
    pub signature: String,
}

impl AccessCommitment {
    /// Sign a commitment with the peer's key pair
    pub fn sign(keypair: &PeerKeypair, counterparty: Option<PeerId>) -> Self {
        let timestamp = Utc::now();
        let message = Self::canonical_message(keypair.peer_id(), counterparty.as_ref(), timestamp);
        let signature = keypair.sign(domain::ACCESS_COMMITMENT, message.as_bytes());
        Self {
            identity: keypair.peer_id().clone(),
            counterparty,
            timestamp,
            signature: hex::encode(signature),
        }
    }

    /// Verify the signature against the registry
    pub fn verify(&self, registry: &KeyRegistry) -> CoreResult<()> {
        let message =
            Self::canonical_message(&self.identity, self.counterparty.as_ref(), self.timestamp);
        let signature = hex::decode(&self.signature)
            .map_err(|_| CoreError::InvalidSignature(self.identity.to_string()))?;
        registry.verify(
            &self.identity,
            domain::ACCESS_COMMITMENT,
            message.as_bytes(),
            &signature,
        )
    }

    /// Whether the commitment timestamp is within `skew` of now, either side
    pub fn is_fresh(&self, skew: Duration) -> bool {
        let age = Utc::now() - self.timestamp;
        age <= skew && age >= -skew
    }

    /// Absolute age in seconds (negative timestamps clamp to 0)
    pub fn age_seconds(&self) -> i64 {
        (Utc::now() - self.timestamp).num_seconds().abs()
    }

    fn canonical_message(
        identity: &PeerId,
        counterparty: Option<&PeerId>,
        timestamp: DateTime<Utc>,
    ) -> String {
        format!(
            "{}|{}|{}",
            identity,
            counterparty.map(|p| p.as_str()).unwrap_or("-"),
            timestamp.to_rfc3339()
        )
    }
}
