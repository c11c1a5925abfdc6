//! YouTube client configuration.

use std::path::PathBuf;
use std::time::Duration;
use vpub_models::PublishDefaults;

pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_UPLOAD_BASE_URL: &str = "https://www.googleapis.com/upload/youtube/v3";

/// YouTube client configuration.
#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    /// Data API base URL (list, delete)
    pub api_base_url: String,
    /// Media upload base URL
    pub upload_base_url: String,
    /// Timeout for catalog calls
    pub timeout: Duration,
    /// Connect timeout for every call
    pub connect_timeout: Duration,
    /// Limit for a whole upload request, body included
    pub upload_timeout: Duration,
    /// Bytes read from disk per upload chunk
    pub upload_chunk_size: usize,
    /// Number of videos returned by `list`
    pub catalog_page_size: u32,
    /// Metadata applied to uploads
    pub publish: PublishDefaults,
    /// Token file written by the OAuth callback
    pub tokens_path: PathBuf,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            upload_base_url: DEFAULT_UPLOAD_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            upload_timeout: Duration::from_secs(1800),
            upload_chunk_size: 256 * 1024,
            catalog_page_size: 10,
            publish: PublishDefaults::default(),
            tokens_path: PathBuf::from("tokens.json"),
        }
    }
}

impl YouTubeConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let timeout_secs: u64 = std::env::var("YOUTUBE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);
        let upload_timeout_secs: u64 = std::env::var("YOUTUBE_UPLOAD_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1800);

        let mut publish = defaults.publish.clone();
        if let Ok(category) = std::env::var("YOUTUBE_CATEGORY_ID") {
            if !category.trim().is_empty() {
                publish.category_id = category.trim().to_string();
            }
        }

        Self {
            api_base_url: std::env::var("YOUTUBE_API_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            upload_base_url: std::env::var("YOUTUBE_UPLOAD_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.upload_base_url),
            timeout: Duration::from_secs(timeout_secs),
            upload_timeout: Duration::from_secs(upload_timeout_secs),
            catalog_page_size: std::env::var("YOUTUBE_CATALOG_PAGE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &u32| (1..=50).contains(n))
                .unwrap_or(defaults.catalog_page_size),
            tokens_path: std::env::var("YOUTUBE_TOKENS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.tokens_path),
            publish,
            ..defaults
        }
    }

    /// Config pointing both base URLs at `base` (mock servers).
    pub fn with_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            api_base_url: format!("{}/youtube/v3", base),
            upload_base_url: format!("{}/upload/youtube/v3", base),
            ..Self::default()
        }
    }
}
