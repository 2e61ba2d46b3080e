//! Records carried on the generation SSE stream.
//!
//! Every record is sent as a bare `data: <json>` frame. Progress frames
//! are [`StatusEvent`](aether_core::status::StatusEvent)s; the stream
//! always ends with exactly one [`CompletionRecord`].

use std::time::Duration;

use aether_core::media::media_url;
use aether_sonauto::orchestrator::{GenerationError, GenerationOutcome};
use axum::response::sse::Event;
use serde::Serialize;

/// Interval between keep-alive comments on an idle stream.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Summary error shown to the user when a generation fails.
pub const GENERATION_FAILED: &str = "Failed to generate audio";

/// Final record of a generation stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CompletionRecord {
    Success(SuccessRecord),
    Failure(FailureRecord),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessRecord {
    pub tts_lyrics: Option<String>,
    /// Saved filenames, e.g. `["song_1.mp3", "song_2.mp3"]`.
    pub audio_files: Vec<String>,
    /// Paths at which the saved files are served.
    pub audio_urls: Vec<String>,
    pub request_id: String,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub error: &'static str,
    pub details: String,
    pub complete: bool,
}

impl CompletionRecord {
    pub fn success(outcome: GenerationOutcome) -> Self {
        let audio_urls = outcome
            .saved_files
            .iter()
            .map(|f| media_url(outcome.request_id, f))
            .collect();

        CompletionRecord::Success(SuccessRecord {
            tts_lyrics: outcome.lyrics,
            audio_files: outcome.saved_files,
            audio_urls,
            request_id: outcome.request_id.to_string(),
            complete: true,
        })
    }

    pub fn failure(details: impl Into<String>) -> Self {
        CompletionRecord::Failure(FailureRecord {
            error: GENERATION_FAILED,
            details: details.into(),
            complete: true,
        })
    }
}

impl From<&GenerationError> for CompletionRecord {
    fn from(err: &GenerationError) -> Self {
        CompletionRecord::failure(err.to_string())
    }
}

/// Serialize `payload` into a `data:` frame.
pub fn json_event<T: Serialize>(payload: &T) -> Event {
    Event::default().json_data(payload).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to serialize SSE record");
        Event::default().comment("serialization error")
    })
}

#[cfg(test)]
mod tests {
    use aether_core::types::RequestId;

    use super::*;

    #[test]
    fn success_record_shape() {
        let request_id = RequestId::nil();
        let record = CompletionRecord::success(GenerationOutcome {
            request_id,
            lyrics: Some("la".into()),
            saved_files: vec!["song_1.mp3".into(), "song_2.mp3".into()],
        });

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ttsLyrics": "la",
                "audioFiles": ["song_1.mp3", "song_2.mp3"],
                "audioUrls": [
                    format!("/audio/{request_id}/song_1.mp3"),
                    format!("/audio/{request_id}/song_2.mp3"),
                ],
                "requestId": request_id.to_string(),
                "complete": true,
            })
        );
    }

    #[test]
    fn failure_record_shape() {
        let record = CompletionRecord::from(&GenerationError::RemoteService("quota exceeded".into()));
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["error"], "Failed to generate audio");
        assert_eq!(json["details"], "Sonauto generation failed: quota exceeded");
        assert_eq!(json["complete"], true);
    }
}
