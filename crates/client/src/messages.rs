//! Request and response bodies exchanged with the studio backend.
//!
//! Field names follow the backend's JSON. Status responses convert into
//! the tracker's normalized [`OperationSnapshot`].

use serde::{Deserialize, Serialize};
use studio_core::assets::Hotspot;
use studio_core::beats::{Beat, BeatSequence};
use studio_core::gallery::GalleryItem;
use studio_core::operation::OperationSnapshot;
use validator::Validate;

// ---------------------------------------------------------------------------
// Generation jobs
// ---------------------------------------------------------------------------

/// Body of `POST /generate`.
///
/// Only the fields the console sets itself are typed; every other
/// generation knob travels through `overrides` untouched.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerateRequest {
    pub topic_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    #[validate(range(min = 10, max = 120))]
    pub duration_seconds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    pub render_mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.5, max = 2.0))]
    pub speech_speed: Option<f64>,
    #[serde(flatten)]
    pub overrides: serde_json::Map<String, serde_json::Value>,
}

impl GenerateRequest {
    /// A request with backend defaults for everything but the prompt.
    pub fn new(topic_prompt: impl Into<String>) -> Self {
        Self {
            topic_prompt: topic_prompt.into(),
            style: None,
            preset_name: None,
            template_name: None,
            duration_seconds: 35,
            voice: None,
            render_mode: studio_core::generation::RENDER_MODE_FINAL.to_string(),
            speech_speed: None,
            overrides: serde_json::Map::new(),
        }
    }
}

/// Response of the job creation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCreated {
    pub job_id: String,
}

/// Response of `GET /status/{job_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub status: String,
    #[serde(default)]
    pub progress: i64,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub output_video_url: Option<String>,
    #[serde(default)]
    pub preview_video_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl From<JobStatusResponse> for OperationSnapshot {
    fn from(r: JobStatusResponse) -> Self {
        OperationSnapshot::new(r.status, r.progress, r.logs)
            .with_preview_ref(r.preview_video_url)
            .with_result_ref(r.output_video_url)
    }
}

/// Body of `POST /projects/{job_id}/render_from_beats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderFromBeatsRequest {
    pub regenerate_voice: bool,
    pub regenerate_captions: bool,
    pub regenerate_render: bool,
    pub preview_mode: bool,
    pub preview_start: f64,
    pub preview_duration: f64,
}

impl Default for RenderFromBeatsRequest {
    fn default() -> Self {
        Self {
            regenerate_voice: false,
            regenerate_captions: false,
            regenerate_render: true,
            preview_mode: false,
            preview_start: 0.0,
            preview_duration: 10.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Grouped generation
// ---------------------------------------------------------------------------

/// Default number of jobs queued by `POST /generate_variations`.
pub const DEFAULT_VARIATION_COUNT: u32 = 5;

/// Body of `POST /generate_variations`. The backend derives `count`
/// requests from the prompt and queues them under one `var-` group.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerateVariationsRequest {
    pub topic_prompt: String,
    #[serde(default)]
    pub preset_name: Option<String>,
    #[validate(range(min = 1, max = 10))]
    pub count: u32,
}

impl GenerateVariationsRequest {
    pub fn new(topic_prompt: impl Into<String>) -> Self {
        Self {
            topic_prompt: topic_prompt.into(),
            preset_name: None,
            count: DEFAULT_VARIATION_COUNT,
        }
    }
}

/// One arm of an A/B test: generation fields that differ from the base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbVariant {
    pub name: String,
    #[serde(default)]
    pub overrides: serde_json::Map<String, serde_json::Value>,
}

impl AbVariant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            overrides: serde_json::Map::new(),
        }
    }

    /// Set one override field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }
}

/// Body of `POST /ab_generate`. Each variant becomes one job in a shared
/// `ab-` group, labelled with the variant name.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AbGenerateRequest {
    pub topic_prompt: String,
    #[serde(default)]
    pub preset_name: Option<String>,
    #[validate(length(min = 1))]
    pub variants: Vec<AbVariant>,
}

/// Response of the grouped generation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobBatchCreated {
    #[serde(default)]
    pub job_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Model downloads
// ---------------------------------------------------------------------------

/// Body of `POST /models/download`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DownloadRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub kind: String,
    #[validate(length(min = 1))]
    pub urls: Vec<String>,
    #[serde(default)]
    pub overwrite: bool,
}

/// Body of `POST /models/recommended/download`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedDownloadRequest {
    pub model_id: String,
}

/// Response of the download creation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadCreated {
    pub download_id: String,
}

/// Response of `GET /models/status/{download_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadStatusResponse {
    pub status: String,
    #[serde(default)]
    pub progress: i64,
    #[serde(default)]
    pub downloaded_bytes: u64,
    #[serde(default)]
    pub total_bytes: u64,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
}

impl From<DownloadStatusResponse> for OperationSnapshot {
    fn from(r: DownloadStatusResponse) -> Self {
        OperationSnapshot::new(r.status, r.progress, r.logs).with_result_ref(r.output_dir)
    }
}

// ---------------------------------------------------------------------------
// Beats
// ---------------------------------------------------------------------------

/// Response of `GET /projects/{job_id}/beats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeatsResponse {
    #[serde(default)]
    pub beats: Vec<Beat>,
    #[serde(default)]
    pub full_voiceover_text: Option<String>,
    #[serde(default)]
    pub hook: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl From<BeatsResponse> for BeatSequence {
    fn from(r: BeatsResponse) -> Self {
        BeatSequence::new(r.beats, r.hook, r.title)
    }
}

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

/// Response of `GET /assets/metadata`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub path: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub hotspots: Vec<Hotspot>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

/// Body of `PUT /assets/tags`: the full tag set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagsUpdate {
    pub path: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub tags: Vec<String>,
}

/// Body of `PUT /assets/hotspots`: the full hotspot list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotsUpdate {
    pub path: String,
    pub hotspots: Vec<Hotspot>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// One generated project as listed in the gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub job_id: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub final_path: Option<String>,
    #[serde(default)]
    pub thumb_path: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub variant_name: Option<String>,
}

impl ProjectInfo {
    /// Card title: project title, else the prompt, with the variant suffix.
    pub fn display_title(&self) -> String {
        let base = self.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(&self.prompt);
        match self.variant_name.as_deref() {
            Some(v) if !v.is_empty() => format!("{base} ({v})"),
            _ => base.to_string(),
        }
    }
}

impl GalleryItem for ProjectInfo {
    fn operation_id(&self) -> &str {
        &self.job_id
    }

    fn group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
    }
}

/// Response of `GET /projects`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectList {
    #[serde(default)]
    pub projects: Vec<ProjectInfo>,
}

/// A saved generation preset. Only the name is interpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(flatten)]
    pub settings: serde_json::Map<String, serde_json::Value>,
}

/// Response of `GET /presets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetList {
    #[serde(default)]
    pub presets: Vec<Preset>,
}

/// One automation campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignSummary {
    pub campaign_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
}

/// Response of `GET /campaigns`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignList {
    #[serde(default)]
    pub campaigns: Vec<CampaignSummary>,
}

/// Response of `GET /config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponse {
    #[serde(default)]
    pub values: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub defaults: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub env_path: Option<String>,
    #[serde(default)]
    pub missing: Vec<String>,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ffmpeg_ok: bool,
    pub ffprobe_ok: bool,
    pub piper_ok: bool,
    pub llm_model_ok: bool,
    pub whisper_model_ok: bool,
    pub gpu_available: bool,
    #[serde(default)]
    pub available_voices: Vec<String>,
}

impl HealthResponse {
    /// The pipeline can run when ffmpeg and the TTS engine are present.
    pub fn dependencies_ok(&self) -> bool {
        self.ffmpeg_ok && self.piper_ok
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
