//! Timed beat sequence of a generated script.
//!
//! A [`BeatSequence`] is edited entirely in memory. Array order is the
//! authoritative order; `t` is descriptive and is never re-sorted. The
//! `hook` field is a denormalized copy of the first beat's text and is
//! re-synchronized by every edit that changes what sits at index 0.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Text given to beats created with [`BeatSequence::append`].
pub const PLACEHOLDER_BEAT_TEXT: &str = "New beat";

/// Default spacing between an appended beat and the previous one.
pub const DEFAULT_BEAT_GAP_SECS: f64 = 2.0;

/// One narration/caption unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beat {
    /// Start time in seconds.
    pub t: f64,
    pub text: String,
    /// On-screen caption; written together with `text` by the editor.
    #[serde(default)]
    pub on_screen: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emphasis: Option<bool>,
}

impl Beat {
    pub fn new(t: f64, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            t,
            on_screen: text.clone(),
            text,
            emphasis: None,
        }
    }
}

/// Ordered beats plus the hook and title that travel with them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeatSequence {
    #[serde(default)]
    pub beats: Vec<Beat>,
    #[serde(default)]
    pub hook: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl BeatSequence {
    pub fn new(beats: Vec<Beat>, hook: Option<String>, title: Option<String>) -> Self {
        Self { beats, hook, title }
    }

    pub fn len(&self) -> usize {
        self.beats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }

    /// Set the start time of a beat. Times must be finite and non-negative.
    pub fn set_time(&mut self, index: usize, t: f64) -> Result<(), CoreError> {
        self.check_index(index)?;
        validate_beat_time(t)?;
        self.beats[index].t = t;
        Ok(())
    }

    /// Set the text (and on-screen caption) of a beat.
    pub fn set_text(&mut self, index: usize, text: impl Into<String>) -> Result<(), CoreError> {
        self.check_index(index)?;
        let text = text.into();
        let beat = &mut self.beats[index];
        beat.on_screen = text.clone();
        beat.text = text;
        if index == 0 {
            self.sync_hook();
        }
        Ok(())
    }

    /// Swap with the previous beat. No-op for the first beat.
    pub fn move_up(&mut self, index: usize) -> Result<(), CoreError> {
        self.check_index(index)?;
        if index == 0 {
            return Ok(());
        }
        self.beats.swap(index - 1, index);
        if index == 1 {
            self.sync_hook();
        }
        Ok(())
    }

    /// Swap with the next beat. No-op for the last beat.
    pub fn move_down(&mut self, index: usize) -> Result<(), CoreError> {
        self.check_index(index)?;
        if index + 1 == self.beats.len() {
            return Ok(());
        }
        self.beats.swap(index, index + 1);
        if index == 0 {
            self.sync_hook();
        }
        Ok(())
    }

    /// Delete a beat. Remaining `t` values are left untouched.
    pub fn remove(&mut self, index: usize) -> Result<Beat, CoreError> {
        self.check_index(index)?;
        let removed = self.beats.remove(index);
        if index == 0 {
            self.sync_hook();
        }
        Ok(removed)
    }

    /// Append a placeholder beat `gap_secs` after the last one (or at 0).
    ///
    /// Returns the index of the new beat.
    pub fn append(&mut self, gap_secs: f64) -> Result<usize, CoreError> {
        validate_beat_time(gap_secs)?;
        let t = self.beats.last().map(|b| b.t + gap_secs).unwrap_or(0.0);
        self.beats.push(Beat::new(t, PLACEHOLDER_BEAT_TEXT));
        let index = self.beats.len() - 1;
        if index == 0 {
            self.sync_hook();
        }
        Ok(index)
    }

    // ---- private helpers ----

    fn check_index(&self, index: usize) -> Result<(), CoreError> {
        if index < self.beats.len() {
            Ok(())
        } else {
            Err(CoreError::OutOfRange {
                index,
                len: self.beats.len(),
            })
        }
    }

    /// Copy the first beat's text into `hook`. An empty sequence keeps the
    /// last known hook.
    fn sync_hook(&mut self) {
        if let Some(first) = self.beats.first() {
            self.hook = Some(first.text.clone());
        }
    }
}

/// Validate a beat time or gap: finite and non-negative.
pub fn validate_beat_time(t: f64) -> Result<(), CoreError> {
    if t.is_finite() && t >= 0.0 {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Beat time must be a non-negative number, got {t}"
        )))
    }
}
