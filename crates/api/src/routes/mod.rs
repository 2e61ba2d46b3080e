pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the generation route tree.
///
/// ```text
/// /generate                          start a generation, SSE progress stream (POST)
/// /audio/{request_id}/{filename}     saved song for a finished request (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/generate", post(handlers::generation::generate))
        .route(
            "/audio/{request_id}/{filename}",
            get(handlers::audio::get_audio),
        )
}
