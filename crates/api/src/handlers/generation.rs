//! Song generation endpoint.
//!
//! `POST /generate` validates the request, spawns the generation
//! lifecycle, and answers with an SSE stream narrating its progress.
//! The lifecycle is cancelled when the client drops the stream.

use std::convert::Infallible;
use std::sync::Arc;

use aether_core::generation::{
    GenerationRequest, OutputFormat, DEFAULT_BALANCE_STRENGTH, DEFAULT_PROMPT_STRENGTH,
    DEFAULT_TEMPO_BPM,
};
use aether_core::status::StatusEvent;
use aether_core::types::RequestId;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::stream::Stream;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};
use crate::sse::{json_event, CompletionRecord, KEEP_ALIVE_INTERVAL};
use crate::state::AppState;

/// Buffered status events between the lifecycle task and the stream.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Request body for `POST /generate`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateInput {
    #[serde(alias = "prompt")]
    pub user_input: Option<String>,
    #[serde(alias = "tempo")]
    pub bpm: Option<u32>,
    pub balance: Option<f64>,
    pub prompt_strength: Option<f64>,
    pub output_format: Option<OutputFormat>,
}

impl GenerateInput {
    /// Apply defaults and validate, producing the domain request.
    pub fn into_request(self) -> AppResult<GenerationRequest> {
        let request = GenerationRequest::new(self.user_input.unwrap_or_default())
            .with_tempo(self.bpm.unwrap_or(DEFAULT_TEMPO_BPM))
            .with_balance_strength(self.balance.unwrap_or(DEFAULT_BALANCE_STRENGTH))
            .with_prompt_strength(self.prompt_strength.unwrap_or(DEFAULT_PROMPT_STRENGTH))
            .with_output_format(self.output_format.unwrap_or_default());

        request.validate()?;
        Ok(request)
    }
}

// ---------------------------------------------------------------------------
// POST /generate
// ---------------------------------------------------------------------------

/// Start a generation and stream its progress.
///
/// Invalid input is rejected with a JSON 400 before the stream opens.
/// Once streaming, every outcome (including configuration and remote
/// failures) is reported as a final record with `complete: true`.
pub async fn generate(
    State(state): State<AppState>,
    input: Result<Json<GenerateInput>, JsonRejection>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let Json(input) = input.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let request = input.into_request()?;
    let request_id = RequestId::new_v4();

    tracing::info!(
        request_id = %request_id,
        bpm = request.tempo_bpm,
        balance = request.balance_strength,
        "Starting generation",
    );

    let cancel = CancellationToken::new();
    let (tx, mut rx) = mpsc::channel::<StatusEvent>(EVENT_CHANNEL_CAPACITY);

    let orchestrator = Arc::clone(&state.orchestrator);
    let task_cancel = cancel.clone();
    let handle = tokio::spawn(async move {
        orchestrator
            .submit_and_await(request_id, &request, tx, task_cancel)
            .await
    });

    // Dropping the stream (client disconnect) cancels the lifecycle.
    let guard = cancel.drop_guard();

    let stream = async_stream::stream! {
        let _guard = guard;

        yield Ok(json_event(&StatusEvent::started()));

        while let Some(event) = rx.recv().await {
            yield Ok(json_event(&event));
        }

        let record = match handle.await {
            Ok(Ok(outcome)) => {
                yield Ok(json_event(&StatusEvent::completed()));
                CompletionRecord::success(outcome)
            }
            Ok(Err(e)) => {
                tracing::warn!(request_id = %request_id, error = %e, "Generation failed");
                CompletionRecord::from(&e)
            }
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Generation task aborted");
                CompletionRecord::failure("generation task aborted")
            }
        };

        yield Ok(json_event(&record));
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("heartbeat"),
    ))
}
