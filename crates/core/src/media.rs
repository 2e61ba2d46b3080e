//! Saved media naming convention and lookup validation.
//!
//! Result files are named `song_<n>.<ext>` where `n` is the 1-based
//! position in the remote result list. Names coming back from clients are
//! only accepted when they match that exact shape, so a lookup can never
//! escape the request's media directory.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;
use crate::generation::OutputFormat;
use crate::types::RequestId;

/// Pattern for a saved media filename: `song_1.mp3` .. `song_999.m4a`.
pub const MEDIA_FILENAME_PATTERN: &str = r"^song_([1-9][0-9]{0,2})\.(mp3|wav|flac|ogg|m4a)$";

static MEDIA_FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(MEDIA_FILENAME_PATTERN).expect("valid regex"));

/// Route prefix under which saved media is served.
pub const MEDIA_ROUTE_PREFIX: &str = "/audio";

/// Filename for the result at `index` (0-based) in the remote result list.
///
/// ```
/// use aether_core::generation::OutputFormat;
/// use aether_core::media::song_filename;
///
/// assert_eq!(song_filename(0, OutputFormat::Mp3), "song_1.mp3");
/// assert_eq!(song_filename(1, OutputFormat::Wav), "song_2.wav");
/// ```
pub fn song_filename(index: usize, format: OutputFormat) -> String {
    format!("song_{}.{}", index + 1, format.extension())
}

/// Validate a client-supplied media filename, returning its format.
pub fn validate_media_filename(name: &str) -> Result<OutputFormat, CoreError> {
    let invalid = || CoreError::Validation(format!("Invalid media filename '{name}'"));

    let captures = MEDIA_FILENAME_RE.captures(name).ok_or_else(invalid)?;
    captures
        .get(2)
        .and_then(|ext| OutputFormat::from_extension(ext.as_str()))
        .ok_or_else(invalid)
}

/// Parse a client-supplied request identifier.
pub fn parse_request_id(raw: &str) -> Result<RequestId, CoreError> {
    RequestId::parse_str(raw)
        .map_err(|_| CoreError::Validation(format!("Invalid request id '{raw}'")))
}

/// Public URL path at which a saved file is served.
pub fn media_url(request_id: RequestId, filename: &str) -> String {
    format!("{MEDIA_ROUTE_PREFIX}/{request_id}/{filename}")
}
