//! Backend seams used by the tracker and the console.
//!
//! [`StudioApi`] implements all three traits; tests substitute scripted
//! fakes.

use async_trait::async_trait;
use studio_core::beats::BeatSequence;

use crate::api::StudioApi;
use crate::error::ApiError;
use crate::messages::{
    AbGenerateRequest, AssetMetadata, BeatsResponse, CampaignList, ConfigResponse,
    DownloadCreated, DownloadRequest, DownloadStatusResponse, GenerateRequest,
    GenerateVariationsRequest, HealthResponse, HotspotsUpdate, JobBatchCreated, JobCreated,
    JobStatusResponse, PresetList, ProjectList, RenderFromBeatsRequest, TagsUpdate,
};

/// Create, poll and cancel long-running operations.
#[async_trait]
pub trait OperationBackend: Send + Sync {
    async fn create_job(&self, request: &GenerateRequest) -> Result<JobCreated, ApiError>;

    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse, ApiError>;

    async fn cancel_job(&self, job_id: &str) -> Result<(), ApiError>;

    async fn render_from_beats(
        &self,
        job_id: &str,
        request: &RenderFromBeatsRequest,
    ) -> Result<JobCreated, ApiError>;

    async fn generate_variations(
        &self,
        request: &GenerateVariationsRequest,
    ) -> Result<JobBatchCreated, ApiError>;

    async fn ab_generate(&self, request: &AbGenerateRequest) -> Result<JobBatchCreated, ApiError>;

    async fn create_download(&self, request: &DownloadRequest)
        -> Result<DownloadCreated, ApiError>;

    async fn download_recommended(&self, model_id: &str) -> Result<DownloadCreated, ApiError>;

    async fn download_status(&self, download_id: &str)
        -> Result<DownloadStatusResponse, ApiError>;
}

/// Read and write per-project and per-asset artifacts.
#[async_trait]
pub trait ArtifactBackend: Send + Sync {
    async fn get_beats(&self, job_id: &str) -> Result<BeatsResponse, ApiError>;

    async fn put_beats(&self, job_id: &str, sequence: &BeatSequence) -> Result<(), ApiError>;

    async fn asset_metadata(&self, path: &str) -> Result<AssetMetadata, ApiError>;

    async fn put_tags(&self, update: &TagsUpdate) -> Result<(), ApiError>;

    async fn put_hotspots(&self, update: &HotspotsUpdate) -> Result<(), ApiError>;
}

/// Listing and housekeeping endpoints.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    async fn list_projects(&self) -> Result<ProjectList, ApiError>;

    async fn list_presets(&self) -> Result<PresetList, ApiError>;

    async fn delete_preset(&self, name: &str) -> Result<(), ApiError>;

    async fn list_campaigns(&self) -> Result<CampaignList, ApiError>;

    async fn config(&self) -> Result<ConfigResponse, ApiError>;

    async fn health(&self) -> Result<HealthResponse, ApiError>;

    async fn approve_pending(&self, batch_id: &str) -> Result<(), ApiError>;

    async fn reject_pending(&self, batch_id: &str) -> Result<(), ApiError>;
}

#[async_trait]
impl OperationBackend for StudioApi {
    async fn create_job(&self, request: &GenerateRequest) -> Result<JobCreated, ApiError> {
        self.generate(request).await
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse, ApiError> {
        StudioApi::job_status(self, job_id).await
    }

    async fn cancel_job(&self, job_id: &str) -> Result<(), ApiError> {
        StudioApi::cancel_job(self, job_id).await
    }

    async fn render_from_beats(
        &self,
        job_id: &str,
        request: &RenderFromBeatsRequest,
    ) -> Result<JobCreated, ApiError> {
        StudioApi::render_from_beats(self, job_id, request).await
    }

    async fn generate_variations(
        &self,
        request: &GenerateVariationsRequest,
    ) -> Result<JobBatchCreated, ApiError> {
        StudioApi::generate_variations(self, request).await
    }

    async fn ab_generate(&self, request: &AbGenerateRequest) -> Result<JobBatchCreated, ApiError> {
        StudioApi::ab_generate(self, request).await
    }

    async fn create_download(
        &self,
        request: &DownloadRequest,
    ) -> Result<DownloadCreated, ApiError> {
        StudioApi::create_download(self, request).await
    }

    async fn download_recommended(&self, model_id: &str) -> Result<DownloadCreated, ApiError> {
        StudioApi::download_recommended(self, model_id).await
    }

    async fn download_status(
        &self,
        download_id: &str,
    ) -> Result<DownloadStatusResponse, ApiError> {
        StudioApi::download_status(self, download_id).await
    }
}

#[async_trait]
impl ArtifactBackend for StudioApi {
    async fn get_beats(&self, job_id: &str) -> Result<BeatsResponse, ApiError> {
        StudioApi::get_beats(self, job_id).await
    }

    async fn put_beats(&self, job_id: &str, sequence: &BeatSequence) -> Result<(), ApiError> {
        StudioApi::put_beats(self, job_id, sequence).await
    }

    async fn asset_metadata(&self, path: &str) -> Result<AssetMetadata, ApiError> {
        StudioApi::asset_metadata(self, path).await
    }

    async fn put_tags(&self, update: &TagsUpdate) -> Result<(), ApiError> {
        StudioApi::put_tags(self, update).await
    }

    async fn put_hotspots(&self, update: &HotspotsUpdate) -> Result<(), ApiError> {
        StudioApi::put_hotspots(self, update).await
    }
}

#[async_trait]
impl CatalogBackend for StudioApi {
    async fn list_projects(&self) -> Result<ProjectList, ApiError> {
        StudioApi::list_projects(self).await
    }

    async fn list_presets(&self) -> Result<PresetList, ApiError> {
        StudioApi::list_presets(self).await
    }

    async fn delete_preset(&self, name: &str) -> Result<(), ApiError> {
        StudioApi::delete_preset(self, name).await
    }

    async fn list_campaigns(&self) -> Result<CampaignList, ApiError> {
        StudioApi::list_campaigns(self).await
    }

    async fn config(&self) -> Result<ConfigResponse, ApiError> {
        StudioApi::config(self).await
    }

    async fn health(&self) -> Result<HealthResponse, ApiError> {
        StudioApi::health(self).await
    }

    async fn approve_pending(&self, batch_id: &str) -> Result<(), ApiError> {
        StudioApi::approve_pending(self, batch_id).await
    }

    async fn reject_pending(&self, batch_id: &str) -> Result<(), ApiError> {
        StudioApi::reject_pending(self, batch_id).await
    }
}
