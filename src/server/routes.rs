//! Router configuration for the web server.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/resolve", post(handlers::resolve))
        .route("/api/process", post(handlers::process))
        .route("/api/download/:file_id", get(handlers::download))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
