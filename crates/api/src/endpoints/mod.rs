//! API endpoints.

mod notifications;

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

/// Liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/notifications", notifications::router())
}
