//! Mesh API
//!
//! HTTP surface for the store node: credential issuance plus object
//! upload, discovery, and download. Also provides the client used by
//! producer and verifier processes.

pub mod client;
pub mod dto;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use client::MeshApiClient;
pub use error::{ApiError, ApiResult};
pub use server::{create_router, run_server};
pub use state::AppState;
