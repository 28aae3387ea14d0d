//! Request handlers

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use mesh_store::{ReadGrant, WriteCredential};
use tracing::info;

use crate::dto::{CredentialRequest, HealthResponse, ObjectListResponse, PutResponse};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Header carrying the write credential secret
pub const SECRET_HEADER: &str = "x-mesh-secret";

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /api/v1/credentials/write
pub async fn issue_write_credential(
    State(state): State<AppState>,
    payload: Result<Json<CredentialRequest>, JsonRejection>,
) -> ApiResult<Json<WriteCredential>> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let credential = state.issuer.issue_write(&request.commitment).await?;
    Ok(Json(credential))
}

/// POST /api/v1/credentials/read
pub async fn issue_read_grant(
    State(state): State<AppState>,
    payload: Result<Json<CredentialRequest>, JsonRejection>,
) -> ApiResult<Json<ReadGrant>> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let grant = state.issuer.issue_read(&request.commitment).await?;
    Ok(Json(grant))
}

/// PUT /objects/:identity/*key
///
/// Requires a valid write secret bound to `identity`.
pub async fn put_object(
    State(state): State<AppState>,
    Path((identity, key)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<PutResponse>> {
    let secret = headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing write credential".to_string()))?;
    state.issuer.validate_write_secret(&identity, secret).await?;

    let key = key.trim_start_matches('/').to_string();
    state.store.put(&identity, &key, &body).await?;

    info!(identity = %identity, key = %key, size = body.len(), "chunk committed");
    Ok(Json(PutResponse {
        key,
        size: body.len() as u64,
    }))
}

/// GET /objects/:identity
///
/// Discovery is open to any reader; only committed objects appear.
pub async fn list_objects(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> ApiResult<Json<ObjectListResponse>> {
    let objects = state.store.list(&identity).await?;
    Ok(Json(ObjectListResponse { identity, objects }))
}

/// GET /objects/:identity/*key
pub async fn get_object(
    State(state): State<AppState>,
    Path((identity, key)): Path<(String, String)>,
) -> ApiResult<Bytes> {
    let key = key.trim_start_matches('/');
    let bytes = state.store.get(&identity, key).await?;
    Ok(Bytes::from(bytes))
}
