//! Shared server state

use std::sync::Arc;

use mesh_store::{CredentialIssuer, ObjectStore};

/// State shared by all request handlers
#[derive(Clone)]
pub struct AppState {
    pub issuer: Arc<CredentialIssuer>,
    pub store: Arc<dyn ObjectStore>,
}

impl AppState {
    pub fn new(issuer: Arc<CredentialIssuer>, store: Arc<dyn ObjectStore>) -> Self {
        Self { issuer, store }
    }
}
