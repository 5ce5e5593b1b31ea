//! Generation request checks applied before a job is dispatched.

use crate::error::CoreError;

/// Minimum topic prompt length, counted after trimming.
pub const MIN_PROMPT_LEN: usize = 3;

/// Render the full video.
pub const RENDER_MODE_FINAL: &str = "final";
/// Render a short low-cost preview.
pub const RENDER_MODE_PREVIEW: &str = "preview";

/// Validate a topic prompt: at least [`MIN_PROMPT_LEN`] characters after
/// trimming.
pub fn validate_prompt(prompt: &str) -> Result<(), CoreError> {
    if prompt.trim().chars().count() < MIN_PROMPT_LEN {
        return Err(CoreError::Validation(format!(
            "Prompt must be at least {MIN_PROMPT_LEN} characters."
        )));
    }
    Ok(())
}

/// Map a free-form render mode to one of the two accepted values.
/// Anything other than `preview` renders the final video.
pub fn normalize_render_mode(mode: &str) -> &'static str {
    if mode == RENDER_MODE_PREVIEW {
        RENDER_MODE_PREVIEW
    } else {
        RENDER_MODE_FINAL
    }
}
