//! Application state.

use std::sync::Arc;

use vpub_media::{Renderer, RendererConfig};
use vpub_pipeline::{PipelineConfig, PublishPipeline};
use vpub_search::{ImageSearch, UnsplashClient, UnsplashConfig};
use vpub_youtube::{CatalogClient, CredentialStore, FileCredentialStore, Uploader, YouTubeConfig};

use crate::config::ApiConfig;
use crate::paths::AllowedDirs;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: PublishPipeline,
    pub search: Arc<dyn ImageSearch>,
    /// Directories WebSocket clients may name files in
    pub dirs: AllowedDirs,
}

impl AppState {
    /// Wire the production components from environment variables.
    pub fn from_env(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let youtube = YouTubeConfig::from_env();
        let credentials: Arc<dyn CredentialStore> =
            Arc::new(FileCredentialStore::new(youtube.tokens_path.clone()));

        let renderer_config = RendererConfig::from_env();
        let search_config = UnsplashConfig::from_env();
        let dirs = AllowedDirs::new(
            search_config.staging_dir.clone(),
            renderer_config.output_dir.clone(),
        );

        let renderer = Renderer::new(renderer_config);
        let uploader = Uploader::new(youtube.clone(), Arc::clone(&credentials))?;
        let catalog = CatalogClient::new(youtube, credentials)?;
        let pipeline = PublishPipeline::new(
            Arc::new(renderer),
            Arc::new(uploader),
            Arc::new(catalog),
            PipelineConfig::from_env(),
        );

        let search = UnsplashClient::new(search_config)?;

        Ok(Self::new(config, pipeline, Arc::new(search), dirs))
    }

    pub fn new(
        config: ApiConfig,
        pipeline: PublishPipeline,
        search: Arc<dyn ImageSearch>,
        dirs: AllowedDirs,
    ) -> Self {
        Self {
            config,
            pipeline,
            search,
            dirs,
        }
    }
}
