//! Unsplash photo search.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::future::try_join_all;
use futures::StreamExt;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Response};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;
use vpub_models::ImageRef;

use crate::config::UnsplashConfig;
use crate::error::{SearchError, SearchResult};
use crate::ImageSearch;

#[derive(Debug, Deserialize)]
struct SearchPhotosResponse {
    #[serde(default)]
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    id: String,
    urls: PhotoUrls,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    full: String,
}

/// Searches Unsplash for portrait photos and downloads them to the staging
/// directory as `<photo_id>.jpg`.
#[derive(Clone)]
pub struct UnsplashClient {
    http: Client,
    config: UnsplashConfig,
}

impl UnsplashClient {
    pub fn new(config: UnsplashConfig) -> SearchResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("vpub-search/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SearchError::Network)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &UnsplashConfig {
        &self.config
    }

    async fn find_photos(&self, query: &str) -> SearchResult<Vec<Photo>> {
        let url = format!("{}/search/photos", self.config.api_base_url);
        let per_page = self.config.per_page.to_string();

        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("Client-ID {}", self.config.access_key))
            .query(&[
                ("query", query),
                ("per_page", per_page.as_str()),
                ("orientation", "portrait"),
            ])
            .send()
            .await
            .map_err(SearchError::transport)?;

        let status = response.status();
        let body = response.text().await.map_err(SearchError::transport)?;
        if !status.is_success() {
            return Err(SearchError::from_http_status(status.as_u16(), body));
        }

        let parsed: SearchPhotosResponse = serde_json::from_str(&body)
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;
        Ok(parsed.results)
    }

    async fn download(&self, photo: &Photo) -> SearchResult<ImageRef> {
        let source = Url::parse(&photo.urls.full)
            .map_err(|e| SearchError::InvalidResponse(format!("bad image url: {}", e)))?;
        let target = staged_path(&self.config.staging_dir, &photo.id)?;
        let partial = target.with_extension("jpg.part");

        let response = self
            .http
            .get(source)
            .send()
            .await
            .map_err(SearchError::transport)?;
        if !response.status().is_success() {
            return Err(SearchError::DownloadFailed {
                id: photo.id.clone(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let written = match stage_body(response, &partial, &target).await {
            Ok(written) => written,
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(e);
            }
        };

        debug!(photo_id = %photo.id, bytes = written, path = %target.display(), "Image staged");
        Ok(ImageRef::new(photo.id.clone(), target))
    }
}

#[async_trait]
impl ImageSearch for UnsplashClient {
    async fn search(&self, query: &str) -> SearchResult<Vec<ImageRef>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::validation("search query must not be empty"));
        }
        if !self.config.is_configured() {
            return Err(SearchError::Unauthorized(
                "UNSPLASH_ACCESS_KEY is not set".to_string(),
            ));
        }

        let photos = self.find_photos(query).await?;
        tokio::fs::create_dir_all(&self.config.staging_dir).await?;

        let images = try_join_all(photos.iter().map(|photo| self.download(photo))).await?;

        info!(query, count = images.len(), "Image search completed");
        Ok(images)
    }
}

/// Stream `response` into `partial`, then rename it to `target`.
async fn stage_body(response: Response, partial: &Path, target: &Path) -> SearchResult<u64> {
    let mut file = tokio::fs::File::create(partial).await?;
    let mut body = response.bytes_stream();
    let mut written: u64 = 0;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(SearchError::transport)?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    drop(file);
    tokio::fs::rename(partial, target).await?;
    Ok(written)
}

/// `<dir>/<id>.jpg`, refusing ids that could escape `dir`.
fn staged_path(dir: &Path, id: &str) -> SearchResult<PathBuf> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(SearchError::InvalidResponse(format!(
            "unexpected photo id {:?}",
            id
        )));
    }
    Ok(dir.join(format!("{}.jpg", id)))
}
