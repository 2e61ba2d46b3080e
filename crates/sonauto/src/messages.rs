//! Typed Sonauto request and response bodies.
//!
//! Field names match the Sonauto JSON wire format exactly.

use aether_core::generation::{augment_prompt, GenerationRequest, SONGS_PER_GENERATION};
use aether_core::status::GenerationStatus;
use serde::{Deserialize, Serialize};

/// Body of `POST /v1/generations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationPayload {
    pub prompt: String,
    pub instrumental: bool,
    pub balance_strength: f64,
    pub bpm: u32,
    pub prompt_strength: f64,
    pub num_songs: u32,
}

impl GenerationPayload {
    /// Build the submission body for a request, appending a fresh
    /// anti-cache token to the prompt.
    pub fn from_request(request: &GenerationRequest) -> Self {
        Self {
            prompt: augment_prompt(&request.prompt),
            instrumental: request.is_instrumental(),
            balance_strength: request.balance_strength,
            bpm: request.tempo_bpm,
            prompt_strength: request.prompt_strength,
            num_songs: SONGS_PER_GENERATION,
        }
    }
}

/// Response returned by `POST /v1/generations`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    /// Remote task identifier used for polling.
    pub task_id: String,
}

/// Response returned by `GET /v1/generations/{task_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationStatusResponse {
    /// Status string exactly as Sonauto sent it.
    pub status: String,
    /// Download URLs, present on `SUCCESS`.
    #[serde(default)]
    pub song_paths: Option<Vec<String>>,
    #[serde(default)]
    pub lyrics: Option<String>,
    /// Style tags the engine settled on, present on `SUCCESS`.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Present on `FAILURE`.
    #[serde(default)]
    pub error_message: Option<String>,
}

impl GenerationStatusResponse {
    pub fn parsed_status(&self) -> GenerationStatus {
        GenerationStatus::from_remote(&self.status)
    }

    /// Interpret the response as a step of the polling loop.
    pub fn outcome(&self) -> PollOutcome {
        match self.parsed_status() {
            GenerationStatus::Success => PollOutcome::Succeeded {
                song_paths: self.song_paths.clone().unwrap_or_default(),
                lyrics: self.lyrics.clone(),
            },
            GenerationStatus::Failure => PollOutcome::Failed {
                message: self
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "no error message provided".to_string()),
            },
            _ => PollOutcome::Pending,
        }
    }
}

/// What one status poll means for the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Not terminal yet, keep polling.
    Pending,
    Succeeded {
        song_paths: Vec<String>,
        lyrics: Option<String>,
    },
    Failed {
        message: String,
    },
}
