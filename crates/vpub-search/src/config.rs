//! Unsplash client configuration.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.unsplash.com";

#[derive(Debug, Clone)]
pub struct UnsplashConfig {
    pub access_key: String,
    pub api_base_url: String,
    /// Results requested per search
    pub per_page: u32,
    /// Directory downloaded images are written to
    pub staging_dir: PathBuf,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for UnsplashConfig {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            per_page: 5,
            staging_dir: std::env::temp_dir().join("vpub-images"),
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl UnsplashConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            access_key: std::env::var("UNSPLASH_ACCESS_KEY").unwrap_or_default(),
            api_base_url: std::env::var("UNSPLASH_API_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            per_page: std::env::var("UNSPLASH_PER_PAGE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &u32| (1..=30).contains(n))
                .unwrap_or(defaults.per_page),
            staging_dir: std::env::var("IMAGE_STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.staging_dir),
            ..defaults
        }
    }

    /// True when an access key is configured.
    pub fn is_configured(&self) -> bool {
        !self.access_key.trim().is_empty()
    }
}
