//! REST API client for the studio backend.
//!
//! Wraps job creation and status, model downloads, beat and asset
//! metadata, and the catalog endpoints using [`reqwest`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use studio_core::beats::BeatSequence;

use crate::error::{error_message, ApiError};
use crate::messages::{
    AbGenerateRequest, AssetMetadata, BeatsResponse, CampaignList, ConfigResponse,
    DownloadCreated, DownloadRequest, DownloadStatusResponse, GenerateRequest,
    GenerateVariationsRequest, HealthResponse, HotspotsUpdate, JobBatchCreated, JobCreated,
    JobStatusResponse, PresetList, ProjectList, RecommendedDownloadRequest, RenderFromBeatsRequest,
    TagsUpdate,
};

/// HTTP client for one studio backend.
#[derive(Debug, Clone)]
pub struct StudioApi {
    client: reqwest::Client,
    api_url: String,
}

impl StudioApi {
    /// Create a client for a backend.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://127.0.0.1:8000`. A
    ///   trailing slash is dropped.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    // ---- generation jobs ----

    /// Queue a generation job. Sends `POST /generate`.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<JobCreated, ApiError> {
        self.post_json("/generate", request).await
    }

    /// Poll a generation job. Sends `GET /status/{job_id}`.
    pub async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse, ApiError> {
        self.get_json(&format!("/status/{job_id}")).await
    }

    /// Ask the backend to cancel a job. Sends `POST /cancel/{job_id}`;
    /// the response body is ignored.
    pub async fn cancel_job(&self, job_id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url(&format!("/cancel/{job_id}")))
            .send()
            .await?;
        Self::check_status(response).await
    }

    /// Re-render a project from its saved beats. Returns the new job id.
    pub async fn render_from_beats(
        &self,
        job_id: &str,
        request: &RenderFromBeatsRequest,
    ) -> Result<JobCreated, ApiError> {
        self.post_json(&format!("/projects/{job_id}/render_from_beats"), request)
            .await
    }

    /// Queue prompt variations under one group. Sends
    /// `POST /generate_variations`.
    pub async fn generate_variations(
        &self,
        request: &GenerateVariationsRequest,
    ) -> Result<JobBatchCreated, ApiError> {
        self.post_json("/generate_variations", request).await
    }

    /// Queue one job per A/B variant under one group. Sends
    /// `POST /ab_generate`.
    pub async fn ab_generate(
        &self,
        request: &AbGenerateRequest,
    ) -> Result<JobBatchCreated, ApiError> {
        self.post_json("/ab_generate", request).await
    }

    // ---- model downloads ----

    /// Start a model download. Sends `POST /models/download`.
    pub async fn create_download(
        &self,
        request: &DownloadRequest,
    ) -> Result<DownloadCreated, ApiError> {
        self.post_json("/models/download", request).await
    }

    /// Start downloading a model from the recommended catalog.
    pub async fn download_recommended(&self, model_id: &str) -> Result<DownloadCreated, ApiError> {
        let body = RecommendedDownloadRequest {
            model_id: model_id.to_string(),
        };
        self.post_json("/models/recommended/download", &body).await
    }

    /// Poll a download. Sends `GET /models/status/{download_id}`.
    pub async fn download_status(
        &self,
        download_id: &str,
    ) -> Result<DownloadStatusResponse, ApiError> {
        self.get_json(&format!("/models/status/{download_id}")).await
    }

    // ---- beats ----

    pub async fn get_beats(&self, job_id: &str) -> Result<BeatsResponse, ApiError> {
        self.get_json(&format!("/projects/{job_id}/beats")).await
    }

    /// Replace a project's beats, hook and title in one request.
    pub async fn put_beats(&self, job_id: &str, sequence: &BeatSequence) -> Result<(), ApiError> {
        let response = self
            .client
            .put(self.url(&format!("/projects/{job_id}/beats")))
            .json(sequence)
            .send()
            .await?;
        Self::check_status(response).await
    }

    // ---- assets ----

    /// Fetch tags, hotspots and file details. Sends
    /// `GET /assets/metadata?path=...`.
    pub async fn asset_metadata(&self, path: &str) -> Result<AssetMetadata, ApiError> {
        let response = self
            .client
            .get(self.url("/assets/metadata"))
            .query(&[("path", path)])
            .send()
            .await?;
        Self::parse_response(response).await
    }

    pub async fn put_tags(&self, update: &TagsUpdate) -> Result<(), ApiError> {
        self.put_unit("/assets/tags", update).await
    }

    pub async fn put_hotspots(&self, update: &HotspotsUpdate) -> Result<(), ApiError> {
        self.put_unit("/assets/hotspots", update).await
    }

    // ---- catalog ----

    pub async fn list_projects(&self) -> Result<ProjectList, ApiError> {
        self.get_json("/projects").await
    }

    pub async fn list_presets(&self) -> Result<PresetList, ApiError> {
        self.get_json("/presets").await
    }

    pub async fn delete_preset(&self, name: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.url(&format!("/presets/{name}")))
            .send()
            .await?;
        Self::check_status(response).await
    }

    pub async fn list_campaigns(&self) -> Result<CampaignList, ApiError> {
        self.get_json("/campaigns").await
    }

    pub async fn config(&self) -> Result<ConfigResponse, ApiError> {
        self.get_json("/config").await
    }

    pub async fn health(&self) -> Result<HealthResponse, ApiError> {
        self.get_json("/health").await
    }

    /// Approve a batch waiting in the watch-folder queue.
    pub async fn approve_pending(&self, batch_id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url(&format!("/watch_folder/pending/{batch_id}/approve")))
            .send()
            .await?;
        Self::check_status(response).await
    }

    /// Discard a pending watch-folder batch. Sends
    /// `DELETE /watch_folder/pending/{batch_id}`.
    pub async fn reject_pending(&self, batch_id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.url(&format!("/watch_folder/pending/{batch_id}")))
            .send()
            .await?;
        Self::check_status(response).await
    }

    // ---- private helpers ----

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::parse_response(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Self::parse_response(response).await
    }

    async fn put_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let response = self.client.put(self.url(path)).json(body).send().await?;
        Self::check_status(response).await
    }

    /// Ensure the response has a success status code. On failure the body
    /// and its content type are turned into a readable message with
    /// [`error_message`].
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let body = response.text().await.unwrap_or_default();
            let message = error_message(status.as_u16(), &content_type, &body);
            tracing::debug!(status = status.as_u16(), %message, "Backend request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), ApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}
