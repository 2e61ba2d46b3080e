use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether a Sonauto API key is configured.
    pub sonauto_configured: bool,
}

/// GET /health -- returns service status and credential presence.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let sonauto_configured = state.orchestrator.is_configured();

    let status = if sonauto_configured { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        sonauto_configured,
    })
}

/// Mount health check routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
