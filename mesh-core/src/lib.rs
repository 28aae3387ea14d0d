//! Mesh Core
//!
//! Shared domain types for the recordmesh peer network: records and queries,
//! validation verdicts, peer identity and signed access commitments, and
//! the process-wide configuration.

pub mod config;
pub mod error;
pub mod identity;
pub mod types;

pub use config::MeshConfig;
pub use error::{CoreError, CoreResult};
pub use identity::{AccessCommitment, KeyRegistry, PeerId, PeerKeypair};
pub use types::common::Digest;
pub use types::query::{EndpointStatus, QueryResult, RecordQuery};
pub use types::record::{ListingPayload, ListingStatus, Record, RecordSource};
pub use types::verdict::ValidationVerdict;
