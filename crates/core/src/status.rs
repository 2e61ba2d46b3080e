//! Generation status codes and the progress narration table.
//!
//! The remote engine reports one of a fixed set of task statuses. Each
//! maps to a progress percentage and a human-readable message that is
//! pushed to the browser as a [`StatusEvent`].

use serde::{Deserialize, Serialize};

/// Status of a generation, as reported by the remote engine or the gateway.
///
/// `Started` is only ever produced locally. Unrecognised remote values
/// deserialize to `Unknown` and are treated as still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationStatus {
    Started,
    Prompt,
    TaskSent,
    Generating,
    Decompressing,
    Saving,
    Success,
    Failure,
    #[serde(other)]
    Unknown,
}

impl GenerationStatus {
    /// Parse a remote status string. Unrecognised values map to `Unknown`.
    pub fn from_remote(raw: &str) -> Self {
        match raw {
            "STARTED" => GenerationStatus::Started,
            "PROMPT" => GenerationStatus::Prompt,
            "TASK_SENT" => GenerationStatus::TaskSent,
            "GENERATING" => GenerationStatus::Generating,
            "DECOMPRESSING" => GenerationStatus::Decompressing,
            "SAVING" => GenerationStatus::Saving,
            "SUCCESS" => GenerationStatus::Success,
            "FAILURE" => GenerationStatus::Failure,
            _ => GenerationStatus::Unknown,
        }
    }

    /// Progress percentage reported to the client for this status.
    pub fn progress(self) -> u8 {
        match self {
            GenerationStatus::Started => 10,
            GenerationStatus::Prompt => 50,
            GenerationStatus::TaskSent => 55,
            GenerationStatus::Generating => 60,
            GenerationStatus::Decompressing => 80,
            GenerationStatus::Saving => 90,
            GenerationStatus::Success => 95,
            GenerationStatus::Failure => 0,
            GenerationStatus::Unknown => 50,
        }
    }

    /// Client-facing message for this status.
    pub fn message(self) -> &'static str {
        match self {
            GenerationStatus::Started => "Starting audio generation...",
            GenerationStatus::Prompt => "Processing prompt...",
            GenerationStatus::TaskSent => "Task sent to audio engine...",
            GenerationStatus::Generating | GenerationStatus::Unknown => "Generating audio...",
            GenerationStatus::Decompressing => "Processing audio...",
            GenerationStatus::Saving => "Saving audio files...",
            GenerationStatus::Success => "Audio generation complete!",
            GenerationStatus::Failure => "Audio generation failed",
        }
    }

    /// `Success` and `Failure` end the polling loop.
    pub fn is_terminal(self) -> bool {
        matches!(self, GenerationStatus::Success | GenerationStatus::Failure)
    }
}

/// One progress notification pushed to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub status: GenerationStatus,
    pub progress: u8,
    pub message: String,
}

/// Progress reported once the gateway has finished the whole lifecycle.
pub const COMPLETE_PROGRESS: u8 = 100;

impl StatusEvent {
    /// Build the event for a status using the fixed table.
    pub fn for_status(status: GenerationStatus) -> Self {
        Self {
            status,
            progress: status.progress(),
            message: status.message().to_string(),
        }
    }

    /// First event sent by the gateway, before the remote task exists.
    pub fn started() -> Self {
        Self::for_status(GenerationStatus::Started)
    }

    /// Last progress event sent by the gateway after files are saved.
    pub fn completed() -> Self {
        Self {
            status: GenerationStatus::Success,
            progress: COMPLETE_PROGRESS,
            message: GenerationStatus::Success.message().to_string(),
        }
    }
}

impl From<GenerationStatus> for StatusEvent {
    fn from(status: GenerationStatus) -> Self {
        Self::for_status(status)
    }
}
