//! Remote catalog entries.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One video owned by the authenticated account, as reported by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub remote_id: String,
    pub title: String,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl CatalogEntry {
    pub fn new(remote_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            remote_id: remote_id.into(),
            title: title.into(),
            view_count: 0,
            like_count: 0,
            comment_count: 0,
            published_at: None,
            thumbnail_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_entry_camel_case() {
        let entry = CatalogEntry {
            view_count: 12,
            ..CatalogEntry::new("abc", "Sunsets")
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"remoteId\":\"abc\""));
        assert!(json.contains("\"viewCount\":12"));
        assert!(!json.contains("publishedAt"));
    }
}
