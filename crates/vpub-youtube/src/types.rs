//! YouTube Data API wire types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vpub_models::{CatalogEntry, PublishDefaults};

// =============================================================================
// Insert
// =============================================================================

/// JSON part of a `videos.insert` multipart request.
#[derive(Debug, Clone, Serialize)]
pub struct VideoInsert {
    pub snippet: InsertSnippet,
    pub status: InsertStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertSnippet {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub category_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertStatus {
    pub privacy_status: String,
    pub self_declared_made_for_kids: bool,
}

impl VideoInsert {
    pub fn new(
        title: &str,
        description: &str,
        tags: &[String],
        defaults: &PublishDefaults,
    ) -> Self {
        Self {
            snippet: InsertSnippet {
                title: title.to_string(),
                description: description.to_string(),
                tags: tags.to_vec(),
                category_id: defaults.category_id.clone(),
            },
            status: InsertStatus {
                privacy_status: defaults.privacy_status.clone(),
                self_declared_made_for_kids: defaults.made_for_kids,
            },
        }
    }
}

// =============================================================================
// Resources
// =============================================================================

/// A `video` resource; only the parts this client requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Video {
    #[serde(default)]
    pub id: String,
    pub snippet: Option<VideoSnippet>,
    pub statistics: Option<VideoStatistics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    #[serde(default)]
    pub title: String,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Thumbnails {
    pub default: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

impl Thumbnails {
    /// Largest available thumbnail.
    pub fn best_url(&self) -> Option<&str> {
        self.high
            .as_ref()
            .or(self.medium.as_ref())
            .or(self.default.as_ref())
            .map(|t| t.url.as_str())
    }
}

/// Counters arrive as decimal strings and may be absent when hidden.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    pub view_count: Option<String>,
    pub like_count: Option<String>,
    pub comment_count: Option<String>,
}

fn parse_count(value: &Option<String>) -> u64 {
    value.as_deref().and_then(|s| s.parse().ok()).unwrap_or(0)
}

impl From<Video> for CatalogEntry {
    fn from(video: Video) -> Self {
        let snippet = video.snippet.unwrap_or_default();
        let stats = video.statistics.unwrap_or_default();
        CatalogEntry {
            view_count: parse_count(&stats.view_count),
            like_count: parse_count(&stats.like_count),
            comment_count: parse_count(&stats.comment_count),
            published_at: snippet.published_at,
            thumbnail_url: snippet.thumbnails.best_url().map(str::to_string),
            ..CatalogEntry::new(video.id, snippet.title)
        }
    }
}

// =============================================================================
// List responses
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<Video>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    pub id: SearchResultId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultId {
    pub video_id: Option<String>,
}

impl SearchListResponse {
    /// Video ids in result order, skipping non-video results.
    pub fn video_ids(&self) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|r| r.id.video_id.clone())
            .filter(|id| !id.is_empty())
            .collect()
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Google API error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub reason: String,
}

impl ApiErrorResponse {
    pub fn parse_reason(body: &str) -> Option<String> {
        let parsed: ApiErrorResponse = serde_json::from_str(body).ok()?;
        parsed
            .error
            .errors
            .into_iter()
            .map(|e| e.reason)
            .find(|r| !r.is_empty())
    }

    pub fn parse_message(body: &str) -> Option<String> {
        let parsed: ApiErrorResponse = serde_json::from_str(body).ok()?;
        Some(parsed.error.message).filter(|m| !m.is_empty())
    }
}
