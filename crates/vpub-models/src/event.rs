//! Publish progress events.
//!
//! A publish run produces a single ordered stream of these events, terminated
//! by exactly one `Published` or `Failed` event. The same envelope is sent
//! verbatim over the WebSocket API.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::CatalogEntry;
use crate::error::ErrorKind;

/// Pipeline stage an event or failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Render,
    Upload,
    Catalog,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Render => "render",
            PipelineStage::Upload => "upload",
            PipelineStage::Catalog => "catalog",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event discriminant, used for metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PublishEventType {
    Progress,
    Log,
    Warning,
    CatalogRefreshed,
    Published,
    Failed,
}

impl PublishEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishEventType::Progress => "progress",
            PublishEventType::Log => "log",
            PublishEventType::Warning => "warning",
            PublishEventType::CatalogRefreshed => "catalog_refreshed",
            PublishEventType::Published => "published",
            PublishEventType::Failed => "failed",
        }
    }
}

/// Publish event envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PublishEvent {
    /// Composite pipeline progress (0-100)
    Progress { stage: PipelineStage, value: u8 },

    /// Informational log line
    Log {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Non-fatal problem; the run continues
    Warning {
        stage: PipelineStage,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Catalog listing fetched after publishing
    CatalogRefreshed { entries: Vec<CatalogEntry> },

    /// Terminal: the video is live on the platform
    Published {
        #[serde(rename = "remoteId")]
        remote_id: String,
    },

    /// Terminal: the run stopped at `stage`
    Failed {
        stage: PipelineStage,
        kind: ErrorKind,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl PublishEvent {
    /// Create a progress event.
    pub fn progress(stage: PipelineStage, value: u8) -> Self {
        PublishEvent::Progress {
            stage,
            value: value.min(100),
        }
    }

    /// Create a log event.
    pub fn log(message: impl Into<String>) -> Self {
        PublishEvent::Log {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a warning event.
    pub fn warning(stage: PipelineStage, message: impl Into<String>) -> Self {
        PublishEvent::Warning {
            stage,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn catalog_refreshed(entries: Vec<CatalogEntry>) -> Self {
        PublishEvent::CatalogRefreshed { entries }
    }

    pub fn published(remote_id: impl Into<String>) -> Self {
        PublishEvent::Published {
            remote_id: remote_id.into(),
        }
    }

    pub fn failed(stage: PipelineStage, kind: ErrorKind, reason: impl Into<String>) -> Self {
        PublishEvent::Failed {
            stage,
            kind,
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn event_type(&self) -> PublishEventType {
        match self {
            PublishEvent::Progress { .. } => PublishEventType::Progress,
            PublishEvent::Log { .. } => PublishEventType::Log,
            PublishEvent::Warning { .. } => PublishEventType::Warning,
            PublishEvent::CatalogRefreshed { .. } => PublishEventType::CatalogRefreshed,
            PublishEvent::Published { .. } => PublishEventType::Published,
            PublishEvent::Failed { .. } => PublishEventType::Failed,
        }
    }

    /// True for the one event that ends a stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PublishEvent::Published { .. } | PublishEvent::Failed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_serialization() {
        let json = serde_json::to_string(&PublishEvent::progress(PipelineStage::Render, 42)).unwrap();
        assert!(json.contains("\"type\":\"progress\""));
        assert!(json.contains("\"stage\":\"render\""));
        assert!(json.contains("\"value\":42"));
    }

    #[test]
    fn test_progress_clamps() {
        match PublishEvent::progress(PipelineStage::Upload, 150) {
            PublishEvent::Progress { value, .. } => assert_eq!(value, 100),
            other => panic!("Expected Progress, got {:?}", other),
        }
    }

    #[test]
    fn test_terminal_events() {
        assert!(PublishEvent::published("abc").is_terminal());
        assert!(PublishEvent::failed(PipelineStage::Render, ErrorKind::MissingInput, "gone").is_terminal());
        assert!(!PublishEvent::progress(PipelineStage::Render, 10).is_terminal());
        assert!(!PublishEvent::warning(PipelineStage::Catalog, "refresh failed").is_terminal());
    }

    #[test]
    fn test_published_uses_remote_id_key() {
        let json = serde_json::to_string(&PublishEvent::published("abc123")).unwrap();
        assert_eq!(json, r#"{"type":"published","remoteId":"abc123"}"#);
    }

    #[test]
    fn test_failed_roundtrip_keeps_stage_and_kind() {
        let event = PublishEvent::failed(PipelineStage::Upload, ErrorKind::Timeout, "upload timed out");
        let json = serde_json::to_string(&event).unwrap();
        let back: PublishEvent = serde_json::from_str(&json).unwrap();
        match back {
            PublishEvent::Failed { stage, kind, reason, .. } => {
                assert_eq!(stage, PipelineStage::Upload);
                assert_eq!(kind, ErrorKind::Timeout);
                assert_eq!(reason, "upload timed out");
            }
            other => panic!("Expected Failed, got {:?}", other),
        }
    }
}
