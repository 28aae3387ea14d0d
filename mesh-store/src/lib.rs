//! Mesh Store
//!
//! The partitioned object store and the credential issuer. Storage keys are
//! scoped to an identity prefix; chunk writes are idempotent and per-key
//! atomic. The issuer turns signed access commitments into scoped, expiring
//! credentials.

pub mod backend;
pub mod error;
pub mod issuer;
pub mod scope;

pub use backend::local::LocalObjectStore;
pub use backend::memory::MemoryObjectStore;
pub use backend::{ObjectEntry, ObjectStore};
pub use error::{CredentialError, CredentialResult, StoreError, StoreResult};
pub use issuer::{CredentialIssuer, ReadGrant, WriteCredential};
pub use scope::chunk_key;
