//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
}

/// GET /health: liveness plus the record store in use.
pub async fn check<S: Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        store: state.backend,
    })
}
