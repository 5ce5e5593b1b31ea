//! Asset tags and hotspots (background clips, music, sfx, fonts).
//!
//! Both collections are written with full-replacement semantics: every
//! write carries the entire collection. The helpers here compute the new
//! collection; callers send it.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Asset type constants
// ---------------------------------------------------------------------------

/// Background video clips.
pub const ASSET_TYPE_BG_CLIPS: &str = "bg_clips";
/// Music beds.
pub const ASSET_TYPE_MUSIC: &str = "music";
/// Sound effects.
pub const ASSET_TYPE_SFX: &str = "sfx";
/// Caption fonts.
pub const ASSET_TYPE_FONTS: &str = "fonts";

/// All valid asset types.
pub const VALID_ASSET_TYPES: &[&str] = &[
    ASSET_TYPE_BG_CLIPS,
    ASSET_TYPE_MUSIC,
    ASSET_TYPE_SFX,
    ASSET_TYPE_FONTS,
];

/// Validate that an asset type is one of the known types.
pub fn validate_asset_type(asset_type: &str) -> Result<(), CoreError> {
    if VALID_ASSET_TYPES.contains(&asset_type) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Unknown asset type: '{asset_type}'. Valid types: {}",
            VALID_ASSET_TYPES.join(", ")
        )))
    }
}

/// Only background clips carry hotspots.
pub fn supports_hotspots(asset_type: &str) -> bool {
    asset_type == ASSET_TYPE_BG_CLIPS
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

/// Trim each tag and drop empties. Case and duplicates are kept.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Split a comma-separated tag field into normalized tags.
pub fn parse_tag_input(input: &str) -> Vec<String> {
    normalize_tags(input.split(','))
}

// ---------------------------------------------------------------------------
// Hotspots
// ---------------------------------------------------------------------------

/// A labelled time range within a background clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub label: String,
}

impl Hotspot {
    /// Build a validated hotspot: `start >= 0` and `end > start`.
    pub fn new(start: f64, end: f64, label: impl Into<String>) -> Result<Self, CoreError> {
        if !start.is_finite() || start < 0.0 {
            return Err(CoreError::Validation(format!(
                "Hotspot start must be a non-negative number, got {start}"
            )));
        }
        if !end.is_finite() || end <= start {
            return Err(CoreError::Validation(format!(
                "Hotspot end must be greater than start ({start}), got {end}"
            )));
        }
        Ok(Self {
            start,
            end,
            label: label.into(),
        })
    }

    /// Label shown in lists; unlabeled hotspots read as `hotspot`.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            "hotspot"
        } else {
            &self.label
        }
    }
}

/// New list with `hotspot` appended. Overlaps are not checked.
pub fn with_hotspot_added(list: &[Hotspot], hotspot: Hotspot) -> Vec<Hotspot> {
    let mut next = Vec::with_capacity(list.len() + 1);
    next.extend_from_slice(list);
    next.push(hotspot);
    next
}

/// New list without the element at `index`, preserving relative order.
pub fn with_hotspot_removed(list: &[Hotspot], index: usize) -> Result<Vec<Hotspot>, CoreError> {
    if index >= list.len() {
        return Err(CoreError::OutOfRange {
            index,
            len: list.len(),
        });
    }
    Ok(list
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, h)| h.clone())
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
