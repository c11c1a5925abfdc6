//! Stage seams.
//!
//! The orchestrator only sees these traits, so tests can swap in fakes for
//! FFmpeg and the YouTube API.

use async_trait::async_trait;
use tokio::sync::watch;
use vpub_media::{MediaResult, RenderRequest, Renderer};
use vpub_models::{CatalogEntry, PercentCallback, RenderJob, UploadJob};
use vpub_youtube::{CatalogClient, UploadRequest, Uploader, YouTubeResult};

#[async_trait]
pub trait RenderStage: Send + Sync {
    async fn render(
        &self,
        request: RenderRequest,
        on_progress: PercentCallback,
        cancel: watch::Receiver<bool>,
    ) -> MediaResult<RenderJob>;
}

#[async_trait]
pub trait UploadStage: Send + Sync {
    async fn upload(
        &self,
        request: UploadRequest,
        on_progress: PercentCallback,
    ) -> YouTubeResult<UploadJob>;
}

#[async_trait]
pub trait CatalogStage: Send + Sync {
    async fn list(&self) -> YouTubeResult<Vec<CatalogEntry>>;

    async fn delete(&self, remote_id: &str) -> YouTubeResult<()>;
}

#[async_trait]
impl RenderStage for Renderer {
    async fn render(
        &self,
        request: RenderRequest,
        on_progress: PercentCallback,
        cancel: watch::Receiver<bool>,
    ) -> MediaResult<RenderJob> {
        Renderer::render(self, request, on_progress, Some(cancel)).await
    }
}

#[async_trait]
impl UploadStage for Uploader {
    async fn upload(
        &self,
        request: UploadRequest,
        on_progress: PercentCallback,
    ) -> YouTubeResult<UploadJob> {
        Uploader::upload(self, request, on_progress).await
    }
}

#[async_trait]
impl CatalogStage for CatalogClient {
    async fn list(&self) -> YouTubeResult<Vec<CatalogEntry>> {
        CatalogClient::list(self).await
    }

    async fn delete(&self, remote_id: &str) -> YouTubeResult<()> {
        CatalogClient::delete(self, remote_id).await
    }
}
