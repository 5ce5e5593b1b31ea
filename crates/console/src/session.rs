//! Console controller.
//!
//! [`ConsoleSession`] validates and dispatches create commands, hands the
//! returned ids to the [`TrackerRegistry`], and owns the beat editor, the
//! asset editor and the last loaded gallery. Commands take `&mut self`,
//! so a kind's trigger cannot be dispatched twice concurrently.

use std::future::Future;
use std::sync::Arc;

use indexmap::IndexMap;
use studio_client::messages::{
    AbGenerateRequest, CampaignSummary, ConfigResponse, DownloadRequest, GenerateRequest,
    GenerateVariationsRequest, HealthResponse, Preset, ProjectInfo, RenderFromBeatsRequest,
};
use studio_client::{ApiError, ArtifactBackend, CatalogBackend, OperationBackend, StudioApi};
use studio_core::downloads::{parse_url_lines, validate_download_kind, validate_url_list};
use studio_core::error::CoreError;
use studio_core::gallery;
use studio_core::generation::{normalize_render_mode, validate_prompt};
use studio_core::operation::{ControlGates, OperationKind, OperationRecord};
use studio_core::types::OperationId;
use studio_tracker::{TrackerEvent, TrackerRegistry};
use tokio::sync::{broadcast, watch};
use validator::Validate;

use crate::asset_editor::AssetEditor;
use crate::beat_editor::BeatEditor;
use crate::config::ConsoleConfig;
use crate::error::ConsoleError;

pub struct ConsoleSession {
    operations: Arc<dyn OperationBackend>,
    catalog: Arc<dyn CatalogBackend>,
    registry: TrackerRegistry,
    beats: BeatEditor,
    assets: AssetEditor,
    gallery: Vec<ProjectInfo>,
}

impl ConsoleSession {
    pub fn new(
        operations: Arc<dyn OperationBackend>,
        artifacts: Arc<dyn ArtifactBackend>,
        catalog: Arc<dyn CatalogBackend>,
        config: &ConsoleConfig,
    ) -> Self {
        Self {
            registry: TrackerRegistry::new(Arc::clone(&operations), config.tracker_config()),
            operations,
            catalog,
            beats: BeatEditor::new(Arc::clone(&artifacts), config.beat_gap_secs),
            assets: AssetEditor::new(artifacts),
            gallery: Vec::new(),
        }
    }

    /// A session talking to one REST backend.
    pub fn from_api(api: StudioApi, config: &ConsoleConfig) -> Self {
        let api = Arc::new(api);
        Self::new(api.clone(), api.clone(), api, config)
    }

    /// Subscribe to tracker events.
    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.registry.subscribe()
    }

    pub fn beat_editor(&self) -> &BeatEditor {
        &self.beats
    }

    pub fn beat_editor_mut(&mut self) -> &mut BeatEditor {
        &mut self.beats
    }

    pub fn asset_editor(&self) -> &AssetEditor {
        &self.assets
    }

    pub fn asset_editor_mut(&mut self) -> &mut AssetEditor {
        &mut self.assets
    }

    // ---- operations ----

    /// Validate and queue a generation job, then track it.
    pub async fn generate(
        &mut self,
        mut request: GenerateRequest,
    ) -> Result<OperationId, ConsoleError> {
        validate_prompt(&request.topic_prompt)?;
        request.validate()?;
        request.topic_prompt = request.topic_prompt.trim().to_string();
        request.render_mode = normalize_render_mode(&request.render_mode).to_string();

        let operations = Arc::clone(&self.operations);
        let create = async move { operations.create_job(&request).await.map(|c| c.job_id) };
        self.dispatch(OperationKind::GenerationJob, create).await
    }

    /// Start a model download from newline-separated URLs, then track it.
    pub async fn start_download(
        &mut self,
        name: Option<String>,
        kind: &str,
        urls_input: &str,
        overwrite: bool,
    ) -> Result<OperationId, ConsoleError> {
        validate_download_kind(kind)?;
        let urls = parse_url_lines(urls_input);
        validate_url_list(&urls)?;

        let request = DownloadRequest {
            name: name.filter(|n| !n.trim().is_empty()),
            kind: kind.to_string(),
            urls,
            overwrite,
        };
        request.validate()?;

        let operations = Arc::clone(&self.operations);
        let create = async move {
            operations
                .create_download(&request)
                .await
                .map(|c| c.download_id)
        };
        self.dispatch(OperationKind::ModelDownload, create).await
    }

    /// Download a catalog model. Shares the model download slot.
    pub async fn download_recommended(
        &mut self,
        model_id: &str,
    ) -> Result<OperationId, ConsoleError> {
        let model_id = model_id.trim().to_string();
        if model_id.is_empty() {
            return Err(CoreError::Validation("Model id must not be empty".to_string()).into());
        }

        let operations = Arc::clone(&self.operations);
        let create = async move {
            operations
                .download_recommended(&model_id)
                .await
                .map(|c| c.download_id)
        };
        self.dispatch(OperationKind::ModelDownload, create).await
    }

    /// Ask the backend to cancel the tracked generation job.
    ///
    /// Tracking continues until the backend reports a terminal status.
    pub async fn cancel_job(&mut self) -> Result<(), ConsoleError> {
        let job_id = self
            .registry
            .record(OperationKind::GenerationJob)
            .filter(|_| self.registry.is_active(OperationKind::GenerationJob))
            .map(|r| r.id().to_string())
            .ok_or(ConsoleError::NoActiveJob)?;

        self.operations.cancel_job(&job_id).await?;
        tracing::info!(operation_id = %job_id, "Cancel requested");
        Ok(())
    }

    // ---- projects ----

    /// Open a project's beats in the editor.
    pub async fn open_project(&mut self, project_id: &str) -> Result<(), ConsoleError> {
        self.beats.open(project_id).await
    }

    /// Re-render the open project from its saved beats and track the new job.
    pub async fn render_from_beats(
        &mut self,
        options: RenderFromBeatsRequest,
    ) -> Result<OperationId, ConsoleError> {
        let project_id = self
            .beats
            .project_id()
            .map(str::to_string)
            .ok_or(ConsoleError::NoProjectOpen)?;

        let operations = Arc::clone(&self.operations);
        let create = async move {
            operations
                .render_from_beats(&project_id, &options)
                .await
                .map(|c| c.job_id)
        };
        self.dispatch(OperationKind::GenerationJob, create).await
    }

    // ---- grouped generation ----

    /// Queue variations of a prompt as one gallery group, then reload the
    /// gallery. The queued jobs are not tracked.
    pub async fn generate_variations(
        &mut self,
        mut request: GenerateVariationsRequest,
    ) -> Result<Vec<OperationId>, ConsoleError> {
        validate_prompt(&request.topic_prompt)?;
        request.validate()?;
        request.topic_prompt = request.topic_prompt.trim().to_string();
        request.preset_name = request.preset_name.filter(|n| !n.trim().is_empty());

        let created = self.operations.generate_variations(&request).await?;
        tracing::info!(jobs = ?created.job_ids, "Variations queued");
        self.refresh_gallery().await;
        Ok(created.job_ids)
    }

    /// Queue one job per A/B variant as one gallery group, then reload
    /// the gallery. The queued jobs are not tracked.
    pub async fn ab_generate(
        &mut self,
        mut request: AbGenerateRequest,
    ) -> Result<Vec<OperationId>, ConsoleError> {
        validate_prompt(&request.topic_prompt)?;
        request.validate()?;
        if request.variants.iter().any(|v| v.name.trim().is_empty()) {
            return Err(CoreError::Validation("Every variant needs a name".to_string()).into());
        }
        request.topic_prompt = request.topic_prompt.trim().to_string();
        request.preset_name = request.preset_name.filter(|n| !n.trim().is_empty());

        let created = self.operations.ab_generate(&request).await?;
        tracing::info!(jobs = ?created.job_ids, "A/B jobs queued");
        self.refresh_gallery().await;
        Ok(created.job_ids)
    }

    // ---- gallery ----

    /// Fetch the project list and group it for display.
    pub async fn load_gallery(
        &mut self,
    ) -> Result<IndexMap<String, Vec<ProjectInfo>>, ConsoleError> {
        let list = self.catalog.list_projects().await?;
        tracing::debug!(projects = list.projects.len(), "Gallery loaded");
        self.gallery = list.projects;
        Ok(self.gallery_groups())
    }

    /// Last loaded projects, in backend order.
    pub fn gallery(&self) -> &[ProjectInfo] {
        &self.gallery
    }

    pub fn gallery_groups(&self) -> IndexMap<String, Vec<ProjectInfo>> {
        gallery::group(self.gallery.iter().cloned())
    }

    /// Projects sharing `group_id`, for side-by-side comparison.
    pub fn group_compare(&self, group_id: &str) -> Vec<&ProjectInfo> {
        gallery::group_members(&self.gallery, group_id)
    }

    // ---- catalog ----

    pub async fn presets(&self) -> Result<Vec<Preset>, ConsoleError> {
        Ok(self.catalog.list_presets().await?.presets)
    }

    pub async fn delete_preset(&self, name: &str) -> Result<(), ConsoleError> {
        self.catalog.delete_preset(name).await?;
        tracing::info!(name, "Preset deleted");
        Ok(())
    }

    pub async fn campaigns(&self) -> Result<Vec<CampaignSummary>, ConsoleError> {
        Ok(self.catalog.list_campaigns().await?.campaigns)
    }

    pub async fn backend_config(&self) -> Result<ConfigResponse, ConsoleError> {
        Ok(self.catalog.config().await?)
    }

    pub async fn health(&self) -> Result<HealthResponse, ConsoleError> {
        Ok(self.catalog.health().await?)
    }

    /// Approve a watch-folder batch.
    pub async fn approve_pending(&self, batch_id: &str) -> Result<(), ConsoleError> {
        self.catalog.approve_pending(batch_id).await?;
        tracing::info!(batch_id, "Pending batch approved");
        Ok(())
    }

    /// Discard a watch-folder batch without queueing it.
    pub async fn reject_pending(&self, batch_id: &str) -> Result<(), ConsoleError> {
        self.catalog.reject_pending(batch_id).await?;
        tracing::info!(batch_id, "Pending batch rejected");
        Ok(())
    }

    // ---- tracking ----

    /// React to a tracker event. A finished generation job reloads the
    /// gallery; returns whether it did.
    pub async fn handle_event(&mut self, event: &TrackerEvent) -> Result<bool, ConsoleError> {
        if event.is_terminal() && event.kind() == OperationKind::GenerationJob {
            self.load_gallery().await?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Enabled state of the trigger and cancel actions for `kind`.
    pub fn controls(&self, kind: OperationKind) -> ControlGates {
        match self.registry.record(kind) {
            Some(record) if self.registry.is_active(kind) => record.controls(),
            _ => ControlGates::idle(),
        }
    }

    pub fn record(&self, kind: OperationKind) -> Option<OperationRecord> {
        self.registry.record(kind)
    }

    pub fn watch(&self, kind: OperationKind) -> Option<watch::Receiver<OperationRecord>> {
        self.registry.watch(kind)
    }

    pub fn is_tracking(&self, kind: OperationKind) -> bool {
        self.registry.is_active(kind)
    }

    /// Stop all poll loops.
    pub async fn shutdown(&mut self) {
        self.registry.shutdown().await;
    }

    // ---- private helpers ----

    /// Reload the gallery after queueing jobs. The jobs exist either way,
    /// so a failed reload is only logged.
    async fn refresh_gallery(&mut self) {
        if let Err(e) = self.load_gallery().await {
            tracing::warn!(error = %e, "Failed to reload gallery");
        }
    }

    /// Await a create command and track the id it returns. A failed
    /// create leaves the kind's current tracker untouched.
    async fn dispatch<F>(
        &mut self,
        kind: OperationKind,
        create: F,
    ) -> Result<OperationId, ConsoleError>
    where
        F: Future<Output = Result<OperationId, ApiError>>,
    {
        match create.await {
            Ok(id) => {
                tracing::info!(%kind, operation_id = %id, "Operation created");
                self.registry.start(kind, id.clone());
                Ok(id)
            }
            Err(e) => {
                tracing::warn!(%kind, error = %e, "Create command failed");
                Err(e.into())
            }
        }
    }
}
