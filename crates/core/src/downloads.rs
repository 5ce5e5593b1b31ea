//! Model download constants and request validation.
//!
//! Provides the download kind vocabulary, URL list parsing for the
//! newline-separated form field, and URL validation.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Download kind constants
// ---------------------------------------------------------------------------

/// Script-writing language model.
pub const KIND_LLM: &str = "llm";
/// Speech recognition model used for caption alignment.
pub const KIND_WHISPER: &str = "whisper";
/// Text-to-speech voice.
pub const KIND_PIPER: &str = "piper";
/// Anything else; stored under a custom directory.
pub const KIND_CUSTOM: &str = "custom";

/// All valid download kinds.
pub const VALID_DOWNLOAD_KINDS: &[&str] = &[KIND_LLM, KIND_WHISPER, KIND_PIPER, KIND_CUSTOM];

/// Validate that a download kind is one of the known kinds.
pub fn validate_download_kind(kind: &str) -> Result<(), CoreError> {
    if VALID_DOWNLOAD_KINDS.contains(&kind) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Unknown download kind: '{kind}'. Valid kinds: {}",
            VALID_DOWNLOAD_KINDS.join(", ")
        )))
    }
}

// ---------------------------------------------------------------------------
// URL handling
// ---------------------------------------------------------------------------

/// Validate that a download URL is non-empty and starts with `http`.
pub fn validate_download_url(url: &str) -> Result<(), CoreError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Download URL must not be empty".to_string()));
    }
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(CoreError::Validation(format!(
            "Download URL must start with http:// or https://, got: '{trimmed}'"
        )));
    }
    Ok(())
}

/// Parse the newline-separated URL field: trim each line, drop blanks.
pub fn parse_url_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Validate a full URL list: at least one entry, every entry http(s).
pub fn validate_url_list(urls: &[String]) -> Result<(), CoreError> {
    if urls.is_empty() {
        return Err(CoreError::Validation("Add at least one URL".to_string()));
    }
    urls.iter().try_for_each(|u| validate_download_url(u))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
