//! Generation request lifecycle.
//!
//! [`GenerationOrchestrator`] drives one request end to end: submit the
//! job, poll the remote task until it is terminal, download every result
//! into the request's media directory, and narrate progress through a
//! [`StatusEvent`] channel.
//!
//! Polling is bounded by [`OrchestratorConfig::max_wait`]. The caller's
//! [`CancellationToken`] (or dropping the event receiver) stops the
//! lifecycle at the next suspension point.

use std::sync::Arc;
use std::time::Duration;

use aether_core::error::CoreError;
use aether_core::generation::GenerationRequest;
use aether_core::media::song_filename;
use aether_core::status::{GenerationStatus, StatusEvent};
use aether_core::storage::MediaStore;
use aether_core::types::RequestId;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::api::SonautoApiError;
use crate::messages::{GenerationPayload, PollOutcome};
use crate::retry::{retry_transient, RetryConfig, RetryError};
use crate::service::GenerationService;

/// Default delay between two status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Default upper bound on the total time spent polling one task.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(600);

/// Lifecycle settings injected at construction.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Sonauto API key. `None` makes every request fail with
    /// [`GenerationError::Configuration`].
    pub api_key: Option<String>,
    pub poll_interval: Duration,
    pub max_wait: Duration,
    pub retry: RetryConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
            retry: RetryConfig::default(),
        }
    }
}

/// Result of a successful lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub request_id: RequestId,
    /// Lyrics reported with the final `SUCCESS` status, if any.
    pub lyrics: Option<String>,
    /// Saved filenames in remote result order.
    pub saved_files: Vec<String>,
}

/// Errors that end a generation lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// No API credential is configured.
    #[error("Sonauto API key is not configured (set SONAUTO_API_KEY)")]
    Configuration,

    /// The remote service rejected the job or reported `FAILURE`.
    #[error("Sonauto generation failed: {0}")]
    RemoteService(String),

    /// Network failures persisted past the retry budget.
    #[error("Network error talking to Sonauto: {0}")]
    TransientNetwork(String),

    /// The task did not reach a terminal status in time.
    #[error("Generation did not finish within {}s", waited.as_secs())]
    Timeout { waited: Duration },

    /// The client went away or the request was cancelled.
    #[error("Generation cancelled")]
    Cancelled,

    /// A downloaded file could not be written.
    #[error("Failed to store generated audio: {0}")]
    Storage(String),
}

impl From<RetryError> for GenerationError {
    fn from(err: RetryError) -> Self {
        match err {
            RetryError::Cancelled => GenerationError::Cancelled,
            RetryError::Rejected(e) => GenerationError::RemoteService(e.to_string()),
            RetryError::Exhausted { source, .. } => {
                GenerationError::TransientNetwork(source.to_string())
            }
        }
    }
}

impl From<CoreError> for GenerationError {
    fn from(err: CoreError) -> Self {
        GenerationError::Storage(err.to_string())
    }
}

/// Drives generation requests against a [`GenerationService`].
///
/// Cheap to share behind an `Arc`; each call owns its own remote task.
pub struct GenerationOrchestrator<S> {
    service: Arc<S>,
    store: MediaStore,
    config: OrchestratorConfig,
}

impl<S: GenerationService> GenerationOrchestrator<S> {
    pub fn new(service: Arc<S>, store: MediaStore, config: OrchestratorConfig) -> Self {
        Self {
            service,
            store,
            config,
        }
    }

    /// Whether an API credential is available.
    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub fn store(&self) -> &MediaStore {
        &self.store
    }

    /// Run one request to completion.
    ///
    /// Every remote status observed is sent on `events` before it is
    /// acted upon, so the terminal transition always reaches the caller.
    pub async fn submit_and_await(
        &self,
        request_id: RequestId,
        request: &GenerationRequest,
        events: mpsc::Sender<StatusEvent>,
        cancel: CancellationToken,
    ) -> Result<GenerationOutcome, GenerationError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(GenerationError::Configuration)?;

        let payload = GenerationPayload::from_request(request);
        tracing::info!(
            request_id = %request_id,
            bpm = payload.bpm,
            balance_strength = payload.balance_strength,
            instrumental = payload.instrumental,
            "Submitting generation to Sonauto",
        );

        // Submission is not idempotent, so it is attempted exactly once.
        let submitted = tokio::select! {
            _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
            result = self.service.submit(api_key, &payload) => result,
        };
        let task_id = match submitted {
            Ok(response) => response.task_id,
            Err(e @ SonautoApiError::Request(_)) => {
                return Err(GenerationError::TransientNetwork(e.to_string()))
            }
            Err(e @ SonautoApiError::Api { .. }) => {
                return Err(GenerationError::RemoteService(e.to_string()))
            }
        };
        tracing::info!(request_id = %request_id, task_id = %task_id, "Sonauto task created");

        let (song_paths, lyrics) = self
            .poll_until_terminal(request_id, api_key, &task_id, &events, &cancel)
            .await?;

        let saved_files = self
            .save_results(request_id, request, &song_paths, &cancel)
            .await?;

        tracing::info!(
            request_id = %request_id,
            task_id = %task_id,
            files = saved_files.len(),
            "Generation complete",
        );

        Ok(GenerationOutcome {
            request_id,
            lyrics,
            saved_files,
        })
    }

    // ---- private helpers ----

    /// Poll until `SUCCESS` or `FAILURE`, returning result URLs and lyrics.
    async fn poll_until_terminal(
        &self,
        request_id: RequestId,
        api_key: &str,
        task_id: &str,
        events: &mpsc::Sender<StatusEvent>,
        cancel: &CancellationToken,
    ) -> Result<(Vec<String>, Option<String>), GenerationError> {
        let started = Instant::now();
        let deadline = started + self.config.max_wait;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }

            if Instant::now() >= deadline {
                tracing::warn!(request_id = %request_id, task_id, "Sonauto task timed out");
                return Err(GenerationError::Timeout {
                    waited: started.elapsed(),
                });
            }

            let response = retry_transient(&self.config.retry, cancel, "status", || {
                self.service.status(api_key, task_id)
            })
            .await?;

            let status = response.parsed_status();
            if status == GenerationStatus::Unknown {
                tracing::warn!(request_id = %request_id, task_id, status = %response.status, "Unrecognised Sonauto status");
            } else {
                tracing::debug!(request_id = %request_id, task_id, status = %response.status, "Sonauto status");
            }

            // A consumer that stops reading must not hold the task past its deadline.
            tokio::select! {
                _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
                _ = tokio::time::sleep_until(deadline) => {
                    tracing::warn!(request_id = %request_id, task_id, "Status consumer stalled past deadline");
                    return Err(GenerationError::Timeout {
                        waited: started.elapsed(),
                    });
                }
                sent = events.send(StatusEvent::from(status)) => {
                    if sent.is_err() {
                        tracing::info!(request_id = %request_id, "Status receiver dropped, stopping");
                        return Err(GenerationError::Cancelled);
                    }
                }
            }

            match response.outcome() {
                PollOutcome::Pending => continue,
                PollOutcome::Failed { message } => {
                    tracing::warn!(request_id = %request_id, task_id, error = %message, "Sonauto task failed");
                    return Err(GenerationError::RemoteService(message));
                }
                PollOutcome::Succeeded { song_paths, .. } if song_paths.is_empty() => {
                    return Err(GenerationError::RemoteService(
                        "generation succeeded but returned no songs".to_string(),
                    ));
                }
                PollOutcome::Succeeded { song_paths, lyrics } => {
                    if let Some(tags) = &response.tags {
                        tracing::info!(request_id = %request_id, task_id, ?tags, "Final tags used");
                    }
                    return Ok((song_paths, lyrics));
                }
            }
        }
    }

    /// Download every result URL in order and write it to the media store.
    async fn save_results(
        &self,
        request_id: RequestId,
        request: &GenerationRequest,
        song_paths: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, GenerationError> {
        let mut saved = Vec::with_capacity(song_paths.len());

        for (index, url) in song_paths.iter().enumerate() {
            let bytes = retry_transient(&self.config.retry, cancel, "download", || {
                self.service.download(url)
            })
            .await?;

            let filename = song_filename(index, request.output_format);
            self.store.save(request_id, &filename, &bytes).await?;
            saved.push(filename);
        }

        Ok(saved)
    }
}
