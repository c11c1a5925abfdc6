//! YouTube API error types.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use vpub_models::{ErrorKind, ModelError};

use crate::types::ApiErrorResponse;

/// Result type for YouTube operations.
pub type YouTubeResult<T> = Result<T, YouTubeError>;

/// Errors that can occur while talking to the YouTube Data API.
#[derive(Debug, Error)]
pub enum YouTubeError {
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    #[error("Video not found: {0}")]
    NotFound(String),

    #[error("Video file not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl YouTubeError {
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Classify a transport error, keeping timeouts distinct.
    pub fn transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout.as_secs())
        } else {
            Self::Network(err)
        }
    }

    /// Map a non-success HTTP status and its body onto an error.
    ///
    /// Google APIs return 403 for quota and rate-limit problems as well as for
    /// plain permission errors, so the `reason` in the body decides.
    pub fn from_http_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let reason = ApiErrorResponse::parse_reason(&body);
        let message = ApiErrorResponse::parse_message(&body).unwrap_or_else(|| body.clone());

        match status {
            401 => Self::Unauthenticated(message),
            403 => match reason.as_deref() {
                Some("quotaExceeded" | "dailyLimitExceeded" | "uploadLimitExceeded") => {
                    Self::QuotaExceeded(message)
                }
                Some("rateLimitExceeded" | "userRateLimitExceeded") => Self::RateLimited(message),
                _ => Self::Forbidden(message),
            },
            404 => Self::NotFound(message),
            429 => Self::RateLimited(message),
            500..=599 => Self::ServerError(status, message),
            _ => Self::RequestFailed(format!("HTTP {}: {}", status, message)),
        }
    }

    /// HTTP status this error corresponds to, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            YouTubeError::Unauthenticated(_) => Some(401),
            YouTubeError::Forbidden(_) | YouTubeError::QuotaExceeded(_) => Some(403),
            YouTubeError::NotFound(_) => Some(404),
            YouTubeError::RateLimited(_) => Some(429),
            YouTubeError::ServerError(code, _) => Some(*code),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            YouTubeError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            YouTubeError::NotFound(_) => ErrorKind::NotFound,
            YouTubeError::MissingInput(_) => ErrorKind::MissingInput,
            YouTubeError::Validation(_) => ErrorKind::Validation,
            YouTubeError::Timeout(_) => ErrorKind::Timeout,
            YouTubeError::Model(e) => e.kind(),
            YouTubeError::Network(e) if e.is_timeout() => ErrorKind::Timeout,
            YouTubeError::Network(_)
            | YouTubeError::ServerError(_, _)
            | YouTubeError::RateLimited(_) => ErrorKind::Network,
            YouTubeError::QuotaExceeded(_)
            | YouTubeError::Forbidden(_)
            | YouTubeError::RequestFailed(_)
            | YouTubeError::InvalidResponse(_)
            | YouTubeError::Json(_)
            | YouTubeError::Io(_) => ErrorKind::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTA_BODY: &str = r#"{"error":{"code":403,"message":"The request cannot be completed because you have exceeded your quota.","errors":[{"reason":"quotaExceeded","domain":"youtube.quota"}]}}"#;

    #[test]
    fn test_from_http_status_quota() {
        let err = YouTubeError::from_http_status(403, QUOTA_BODY);
        assert!(matches!(err, YouTubeError::QuotaExceeded(ref m) if m.contains("exceeded your quota")));
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_from_http_status_forbidden() {
        let err = YouTubeError::from_http_status(403, r#"{"error":{"errors":[{"reason":"forbidden"}]}}"#);
        assert!(matches!(err, YouTubeError::Forbidden(_)));
    }

    #[test]
    fn test_from_http_status_rate_limit() {
        let err = YouTubeError::from_http_status(
            403,
            r#"{"error":{"errors":[{"reason":"userRateLimitExceeded"}]}}"#,
        );
        assert!(matches!(err, YouTubeError::RateLimited(_)));
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(matches!(YouTubeError::from_http_status(429, ""), YouTubeError::RateLimited(_)));
    }

    #[test]
    fn test_from_http_status_auth_and_missing() {
        let err = YouTubeError::from_http_status(401, "Invalid Credentials");
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
        assert_eq!(err.http_status(), Some(401));

        let err = YouTubeError::from_http_status(404, "videoNotFound");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_from_http_status_server_error() {
        let err = YouTubeError::from_http_status(503, "backend unavailable");
        assert!(matches!(err, YouTubeError::ServerError(503, _)));
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[test]
    fn test_from_http_status_other() {
        let err = YouTubeError::from_http_status(400, "bad request");
        assert!(matches!(err, YouTubeError::RequestFailed(ref m) if m.contains("400")));
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_timeout_kind() {
        assert_eq!(YouTubeError::Timeout(30).kind(), ErrorKind::Timeout);
    }
}
