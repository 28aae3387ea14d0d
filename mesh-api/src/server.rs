//! HTTP server assembly

use std::net::SocketAddr;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::routes;
use crate::state::AppState;

/// Build the router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/api/v1/credentials/write",
            post(routes::issue_write_credential),
        )
        .route("/api/v1/credentials/read", post(routes::issue_read_grant))
        .route("/objects/:identity", get(routes::list_objects))
        .route(
            "/objects/:identity/*key",
            put(routes::put_object).get(routes::get_object),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until shutdown
pub async fn run_server(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "store node listening");
    axum::serve(listener, router).await
}
