//! Generation request model, defaults, and validation.
//!
//! A [`GenerationRequest`] is built once per incoming user call and is
//! immutable afterwards. The derived values sent to the remote engine
//! (instrumental flag, anti-cache prompt suffix) are computed here so
//! they can be tested without any network plumbing.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Defaults and limits
// ---------------------------------------------------------------------------

/// Tempo used when the caller does not supply one.
pub const DEFAULT_TEMPO_BPM: u32 = 135;
/// Balance strength used when the caller does not supply one.
pub const DEFAULT_BALANCE_STRENGTH: f64 = 1.0;
/// Prompt strength used when the caller does not supply one.
pub const DEFAULT_PROMPT_STRENGTH: f64 = 1.56;

/// Balance strength at or below which the song is generated without vocals.
pub const INSTRUMENTAL_BALANCE_THRESHOLD: f64 = 0.15;

/// Number of candidate songs requested per generation.
pub const SONGS_PER_GENERATION: u32 = 2;

/// Maximum prompt length in characters.
pub const MAX_PROMPT_LENGTH: usize = 5_000;
/// Inclusive tempo bounds in beats per minute.
pub const MIN_TEMPO_BPM: u32 = 1;
pub const MAX_TEMPO_BPM: u32 = 300;
/// Inclusive upper bound for prompt strength.
pub const MAX_PROMPT_STRENGTH: f64 = 5.0;

// ---------------------------------------------------------------------------
// Output format
// ---------------------------------------------------------------------------

/// Container format of the saved media files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Mp3,
    Wav,
    Flac,
    Ogg,
    M4a,
}

impl OutputFormat {
    /// All supported formats.
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Mp3,
        OutputFormat::Wav,
        OutputFormat::Flac,
        OutputFormat::Ogg,
        OutputFormat::M4a,
    ];

    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Wav => "wav",
            OutputFormat::Flac => "flac",
            OutputFormat::Ogg => "ogg",
            OutputFormat::M4a => "m4a",
        }
    }

    /// MIME type used when serving a saved file.
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "audio/mpeg",
            OutputFormat::Wav => "audio/wav",
            OutputFormat::Flac => "audio/flac",
            OutputFormat::Ogg => "audio/ogg",
            OutputFormat::M4a => "audio/mp4",
        }
    }

    /// Look up a format by its file extension (case-sensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.extension() == ext)
    }
}

// ---------------------------------------------------------------------------
// Generation request
// ---------------------------------------------------------------------------

/// One user request to generate songs.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub tempo_bpm: u32,
    pub balance_strength: f64,
    pub prompt_strength: f64,
    pub output_format: OutputFormat,
}

impl GenerationRequest {
    /// Create a request with default tempo, balance, strength and format.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            tempo_bpm: DEFAULT_TEMPO_BPM,
            balance_strength: DEFAULT_BALANCE_STRENGTH,
            prompt_strength: DEFAULT_PROMPT_STRENGTH,
            output_format: OutputFormat::default(),
        }
    }

    pub fn with_tempo(mut self, tempo_bpm: u32) -> Self {
        self.tempo_bpm = tempo_bpm;
        self
    }

    pub fn with_balance_strength(mut self, balance_strength: f64) -> Self {
        self.balance_strength = balance_strength;
        self
    }

    pub fn with_prompt_strength(mut self, prompt_strength: f64) -> Self {
        self.prompt_strength = prompt_strength;
        self
    }

    pub fn with_output_format(mut self, output_format: OutputFormat) -> Self {
        self.output_format = output_format;
        self
    }

    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_prompt(&self.prompt)?;
        validate_tempo(self.tempo_bpm)?;
        validate_balance_strength(self.balance_strength)?;
        validate_prompt_strength(self.prompt_strength)
    }

    /// Whether the remote engine should omit vocals.
    pub fn is_instrumental(&self) -> bool {
        is_instrumental(self.balance_strength)
    }
}

/// Low balance strength doubles as an "instrumental only" switch.
pub fn is_instrumental(balance_strength: f64) -> bool {
    balance_strength <= INSTRUMENTAL_BALANCE_THRESHOLD
}

// ---------------------------------------------------------------------------
// Anti-cache token
// ---------------------------------------------------------------------------

/// Build the suffix appended to every submitted prompt.
///
/// The remote engine returns identical output for identical prompts, so
/// each submission carries the current time and a random integer.
pub fn anti_cache_token(now: Timestamp, salt: u32) -> String {
    format!("\n\n[SessionID:{}-{salt}]", now.timestamp_millis())
}

/// Return `prompt` with a fresh anti-cache token appended.
pub fn augment_prompt(prompt: &str) -> String {
    let salt: u32 = rand::rng().random();
    format!("{prompt}{}", anti_cache_token(chrono::Utc::now(), salt))
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Prompt must contain non-whitespace text and stay within the length limit.
pub fn validate_prompt(prompt: &str) -> Result<(), CoreError> {
    if prompt.trim().is_empty() {
        return Err(CoreError::Validation("userInput is required".to_string()));
    }
    let len = prompt.chars().count();
    if len > MAX_PROMPT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Prompt is {len} characters, maximum is {MAX_PROMPT_LENGTH}"
        )));
    }
    Ok(())
}

pub fn validate_tempo(tempo_bpm: u32) -> Result<(), CoreError> {
    if (MIN_TEMPO_BPM..=MAX_TEMPO_BPM).contains(&tempo_bpm) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Tempo must be between {MIN_TEMPO_BPM} and {MAX_TEMPO_BPM} bpm, got {tempo_bpm}"
        )))
    }
}

pub fn validate_balance_strength(balance_strength: f64) -> Result<(), CoreError> {
    if balance_strength.is_finite() && (0.0..=1.0).contains(&balance_strength) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Balance must be between 0 and 1, got {balance_strength}"
        )))
    }
}

pub fn validate_prompt_strength(prompt_strength: f64) -> Result<(), CoreError> {
    if prompt_strength.is_finite() && (0.0..=MAX_PROMPT_STRENGTH).contains(&prompt_strength) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Prompt strength must be between 0 and {MAX_PROMPT_STRENGTH}, got {prompt_strength}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn defaults_match_gateway_contract() {
        let req = GenerationRequest::new("slow piano");
        assert_eq!(req.tempo_bpm, 135);
        assert_eq!(req.balance_strength, 1.0);
        assert_eq!(req.prompt_strength, 1.56);
        assert_eq!(req.output_format, OutputFormat::Mp3);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn instrumental_threshold_is_inclusive() {
        assert!(is_instrumental(0.0));
        assert!(is_instrumental(0.1));
        assert!(is_instrumental(0.15));
        assert!(!is_instrumental(0.150_001));
        assert!(!is_instrumental(0.5));
        assert!(!is_instrumental(1.0));
    }

    #[test]
    fn instrumental_flag_follows_balance_across_range() {
        for step in 0..=100 {
            let balance = f64::from(step) / 100.0;
            let req = GenerationRequest::new("x").with_balance_strength(balance);
            assert_eq!(req.is_instrumental(), balance <= 0.15, "balance {balance}");
        }
    }

    #[test]
    fn anti_cache_token_format() {
        let now = chrono::Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            anti_cache_token(now, 42),
            "\n\n[SessionID:1700000000123-42]"
        );
    }

    #[test]
    fn augmented_prompts_differ_for_identical_input() {
        let a = augment_prompt("slow piano");
        let b = augment_prompt("slow piano");
        assert!(a.starts_with("slow piano\n\n[SessionID:"));
        assert!(b.starts_with("slow piano\n\n[SessionID:"));
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_blank_prompt() {
        assert_matches!(validate_prompt("   "), Err(CoreError::Validation(_)));
        assert_matches!(validate_prompt(""), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_overlong_prompt() {
        let long = "a".repeat(MAX_PROMPT_LENGTH + 1);
        assert_matches!(validate_prompt(&long), Err(CoreError::Validation(_)));
        assert!(validate_prompt(&"a".repeat(MAX_PROMPT_LENGTH)).is_ok());
    }

    #[test]
    fn tempo_bounds() {
        assert!(validate_tempo(1).is_ok());
        assert!(validate_tempo(300).is_ok());
        assert!(validate_tempo(0).is_err());
        assert!(validate_tempo(301).is_err());
    }

    #[test]
    fn balance_bounds() {
        assert!(validate_balance_strength(0.0).is_ok());
        assert!(validate_balance_strength(1.0).is_ok());
        assert!(validate_balance_strength(-0.01).is_err());
        assert!(validate_balance_strength(1.01).is_err());
        assert!(validate_balance_strength(f64::NAN).is_err());
    }

    #[test]
    fn prompt_strength_bounds() {
        assert!(validate_prompt_strength(1.56).is_ok());
        assert!(validate_prompt_strength(f64::INFINITY).is_err());
        assert!(validate_prompt_strength(-1.0).is_err());
    }

    #[test]
    fn format_extension_lookup() {
        for format in OutputFormat::ALL {
            assert_eq!(OutputFormat::from_extension(format.extension()), Some(format));
        }
        assert_eq!(OutputFormat::from_extension("exe"), None);
        assert_eq!(OutputFormat::from_extension("MP3"), None);
    }

    #[test]
    fn format_deserializes_lowercase() {
        let f: OutputFormat = serde_json::from_str("\"flac\"").unwrap();
        assert_eq!(f, OutputFormat::Flac);
    }
}
