//! In-memory studio backend for console tests.
//!
//! Records every call as `(name, json body)` and can be switched into
//! failure modes per call family.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use studio_client::messages::{
    AbGenerateRequest, AssetMetadata, BeatsResponse, CampaignList, ConfigResponse,
    DownloadCreated, DownloadRequest, DownloadStatusResponse, GenerateRequest,
    GenerateVariationsRequest, HealthResponse, HotspotsUpdate, JobBatchCreated, JobCreated,
    JobStatusResponse, PresetList, ProjectInfo, ProjectList, RenderFromBeatsRequest, TagsUpdate,
};
use studio_client::{ApiError, ArtifactBackend, CatalogBackend, OperationBackend};
use studio_console::{ConsoleConfig, ConsoleSession};
use studio_core::assets::Hotspot;
use studio_core::beats::{Beat, BeatSequence};

#[derive(Default)]
pub struct FakeStudio {
    calls: Mutex<Vec<(String, Value)>>,
    next_id: AtomicUsize,
    pub fail_creates: AtomicBool,
    pub fail_writes: AtomicBool,
    pub fail_reads: AtomicBool,
    projects: Mutex<Vec<ProjectInfo>>,
}

impl FakeStudio {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, flag: &AtomicBool, value: bool) {
        flag.store(value, Ordering::SeqCst);
    }

    pub fn set_projects(&self, projects: Vec<ProjectInfo>) {
        *self.projects.lock().unwrap() = projects;
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls whose name starts with `prefix`.
    pub fn calls_named(&self, prefix: &str) -> Vec<(String, Value)> {
        self.calls()
            .into_iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .collect()
    }

    fn record(&self, name: impl Into<String>, body: Value) {
        self.calls.lock().unwrap().push((name.into(), body));
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Queue one job per variant name under `group_id` and list them as
    /// projects, the way the backend does.
    fn queue_group(&self, group_id: &str, prompt: &str, variants: &[String]) -> JobBatchCreated {
        let mut job_ids = Vec::with_capacity(variants.len());
        let mut projects = self.projects.lock().unwrap();
        for variant in variants {
            let job_id = self.next_id("job");
            let mut info = project(&job_id, Some(group_id));
            info.prompt = prompt.to_string();
            info.status = "queued".into();
            info.variant_name = Some(variant.clone());
            projects.push(info);
            job_ids.push(job_id);
        }
        JobBatchCreated { job_ids }
    }

    fn check(&self, flag: &AtomicBool) -> Result<(), ApiError> {
        if flag.load(Ordering::SeqCst) {
            Err(ApiError::Status {
                status: 500,
                message: "Internal Server Error".into(),
            })
        } else {
            Ok(())
        }
    }
}

/// The three-beat sequence every project starts with.
pub fn sample_sequence() -> BeatSequence {
    BeatSequence::new(
        vec![
            Beat::new(0.0, "Hook"),
            Beat::new(2.0, "Fact A"),
            Beat::new(4.0, "Fact B"),
        ],
        Some("Hook".into()),
        Some("Owl facts".into()),
    )
}

pub fn project(job_id: &str, group_id: Option<&str>) -> ProjectInfo {
    ProjectInfo {
        job_id: job_id.into(),
        prompt: format!("prompt {job_id}"),
        style: "default".into(),
        created_at: "2026-01-01T00:00:00Z".into(),
        status: "done".into(),
        title: None,
        final_path: Some(format!("/outputs/{job_id}/final.mp4")),
        thumb_path: None,
        group_id: group_id.map(String::from),
        variant_name: None,
    }
}

pub fn session(studio: &Arc<FakeStudio>) -> ConsoleSession {
    ConsoleSession::new(
        studio.clone(),
        studio.clone(),
        studio.clone(),
        &ConsoleConfig::default(),
    )
}

#[async_trait]
impl OperationBackend for FakeStudio {
    async fn create_job(&self, request: &GenerateRequest) -> Result<JobCreated, ApiError> {
        self.record("create_job", serde_json::to_value(request).unwrap());
        self.check(&self.fail_creates)?;
        Ok(JobCreated {
            job_id: self.next_id("job"),
        })
    }

    async fn job_status(&self, _job_id: &str) -> Result<JobStatusResponse, ApiError> {
        Ok(JobStatusResponse {
            status: "running".into(),
            progress: 50,
            logs: vec![],
            output_video_url: None,
            preview_video_url: None,
            thumbnail_url: None,
        })
    }

    async fn cancel_job(&self, job_id: &str) -> Result<(), ApiError> {
        self.record(format!("cancel_job:{job_id}"), Value::Null);
        Ok(())
    }

    async fn render_from_beats(
        &self,
        job_id: &str,
        request: &RenderFromBeatsRequest,
    ) -> Result<JobCreated, ApiError> {
        self.record(
            format!("render_from_beats:{job_id}"),
            serde_json::to_value(request).unwrap(),
        );
        self.check(&self.fail_creates)?;
        Ok(JobCreated {
            job_id: self.next_id("job"),
        })
    }

    async fn generate_variations(
        &self,
        request: &GenerateVariationsRequest,
    ) -> Result<JobBatchCreated, ApiError> {
        self.record("generate_variations", serde_json::to_value(request).unwrap());
        self.check(&self.fail_creates)?;
        let names: Vec<String> = (1..=request.count).map(|i| format!("var-{i}")).collect();
        Ok(self.queue_group("var-1000", &request.topic_prompt, &names))
    }

    async fn ab_generate(&self, request: &AbGenerateRequest) -> Result<JobBatchCreated, ApiError> {
        self.record("ab_generate", serde_json::to_value(request).unwrap());
        self.check(&self.fail_creates)?;
        let names: Vec<String> = request.variants.iter().map(|v| v.name.clone()).collect();
        Ok(self.queue_group("ab-1000", &request.topic_prompt, &names))
    }

    async fn create_download(
        &self,
        request: &DownloadRequest,
    ) -> Result<DownloadCreated, ApiError> {
        self.record("create_download", serde_json::to_value(request).unwrap());
        self.check(&self.fail_creates)?;
        Ok(DownloadCreated {
            download_id: self.next_id("dl"),
        })
    }

    async fn download_recommended(&self, model_id: &str) -> Result<DownloadCreated, ApiError> {
        self.record("download_recommended", json!({ "model_id": model_id }));
        self.check(&self.fail_creates)?;
        Ok(DownloadCreated {
            download_id: self.next_id("dl"),
        })
    }

    async fn download_status(
        &self,
        _download_id: &str,
    ) -> Result<DownloadStatusResponse, ApiError> {
        Ok(DownloadStatusResponse {
            status: "downloading".into(),
            progress: 30,
            downloaded_bytes: 30,
            total_bytes: 100,
            logs: vec![],
            output_dir: None,
        })
    }
}

#[async_trait]
impl ArtifactBackend for FakeStudio {
    async fn get_beats(&self, job_id: &str) -> Result<BeatsResponse, ApiError> {
        self.record(format!("get_beats:{job_id}"), Value::Null);
        self.check(&self.fail_reads)?;
        let sequence = sample_sequence();
        Ok(BeatsResponse {
            beats: sequence.beats,
            full_voiceover_text: Some("Hook Fact A Fact B".into()),
            hook: sequence.hook,
            title: sequence.title,
        })
    }

    async fn put_beats(&self, job_id: &str, sequence: &BeatSequence) -> Result<(), ApiError> {
        self.record(format!("put_beats:{job_id}"), serde_json::to_value(sequence).unwrap());
        self.check(&self.fail_writes)
    }

    async fn asset_metadata(&self, path: &str) -> Result<AssetMetadata, ApiError> {
        self.record(format!("asset_metadata:{path}"), Value::Null);
        self.check(&self.fail_reads)?;
        Ok(AssetMetadata {
            path: path.into(),
            name: path.rsplit('/').next().unwrap_or(path).into(),
            tags: vec!["ocean".into()],
            hotspots: vec![
                Hotspot::new(0.0, 2.0, "wave").unwrap(),
                Hotspot::new(3.0, 5.0, "gull").unwrap(),
                Hotspot::new(6.0, 8.0, "rock").unwrap(),
            ],
            duration_seconds: Some(10.0),
            size_bytes: Some(1024),
        })
    }

    async fn put_tags(&self, update: &TagsUpdate) -> Result<(), ApiError> {
        self.record("put_tags", serde_json::to_value(update).unwrap());
        self.check(&self.fail_writes)
    }

    async fn put_hotspots(&self, update: &HotspotsUpdate) -> Result<(), ApiError> {
        self.record("put_hotspots", serde_json::to_value(update).unwrap());
        self.check(&self.fail_writes)
    }
}

#[async_trait]
impl CatalogBackend for FakeStudio {
    async fn list_projects(&self) -> Result<ProjectList, ApiError> {
        self.record("list_projects", Value::Null);
        self.check(&self.fail_reads)?;
        Ok(ProjectList {
            projects: self.projects.lock().unwrap().clone(),
        })
    }

    async fn list_presets(&self) -> Result<PresetList, ApiError> {
        self.record("list_presets", Value::Null);
        Ok(serde_json::from_value(json!({
            "presets": [{"name": "shorts", "duration_seconds": 30}]
        }))
        .unwrap())
    }

    async fn delete_preset(&self, name: &str) -> Result<(), ApiError> {
        self.record(format!("delete_preset:{name}"), Value::Null);
        Ok(())
    }

    async fn list_campaigns(&self) -> Result<CampaignList, ApiError> {
        self.record("list_campaigns", Value::Null);
        Ok(CampaignList { campaigns: vec![] })
    }

    async fn config(&self) -> Result<ConfigResponse, ApiError> {
        self.record("config", Value::Null);
        Ok(serde_json::from_value(json!({})).unwrap())
    }

    async fn health(&self) -> Result<HealthResponse, ApiError> {
        self.record("health", Value::Null);
        Ok(serde_json::from_value(json!({
            "ffmpeg_ok": true,
            "ffprobe_ok": true,
            "piper_ok": false,
            "llm_model_ok": true,
            "whisper_model_ok": true,
            "gpu_available": false
        }))
        .unwrap())
    }

    async fn approve_pending(&self, batch_id: &str) -> Result<(), ApiError> {
        self.record(format!("approve_pending:{batch_id}"), Value::Null);
        Ok(())
    }

    async fn reject_pending(&self, batch_id: &str) -> Result<(), ApiError> {
        self.record(format!("reject_pending:{batch_id}"), Value::Null);
        self.check(&self.fail_writes)
    }
}
