//! Saved media download endpoint.

use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::IntoResponse;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /audio/{request_id}/{filename}
// ---------------------------------------------------------------------------

/// Serve one saved song.
///
/// Both path segments are validated against strict patterns before any
/// filesystem access: 400 for malformed names, 404 for absent files.
pub async fn get_audio(
    State(state): State<AppState>,
    Path((request_id, filename)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let media = state
        .orchestrator
        .store()
        .resolve(&request_id, &filename)
        .await?;

    let bytes = tokio::fs::read(&media.path).await.map_err(|e| {
        AppError::InternalError(format!("Failed to read {}: {e}", media.path.display()))
    })?;

    Ok((
        [
            (CONTENT_TYPE, media.format.content_type()),
            (CACHE_CONTROL, "private, max-age=3600"),
        ],
        bytes,
    ))
}
