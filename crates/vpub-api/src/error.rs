//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use vpub_models::ErrorKind;
use vpub_pipeline::PipelineError;
use vpub_search::SearchError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream error: {0}")]
    BadGateway(String),

    #[error("Upstream timed out: {0}")]
    GatewayTimeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Map a component error kind onto an HTTP-facing error.
    pub fn from_kind(kind: ErrorKind, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        match kind {
            ErrorKind::Validation | ErrorKind::MissingInput => Self::BadRequest(msg),
            ErrorKind::Unauthenticated => Self::Unauthorized(msg),
            ErrorKind::NotFound => Self::NotFound(msg),
            ErrorKind::Timeout => Self::GatewayTimeout(msg),
            ErrorKind::Network => Self::BadGateway(msg),
            ErrorKind::Encoding | ErrorKind::Cancelled | ErrorKind::Unknown => Self::Internal(msg),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "unauthenticated",
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Conflict(_) => "busy",
            ApiError::BadGateway(_) => "network",
            ApiError::GatewayTimeout(_) => "timeout",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        if err.is_busy() {
            return Self::Conflict(err.to_string());
        }
        Self::from_kind(err.kind(), err.to_string())
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        Self::from_kind(err.kind(), err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let detail = match &self {
            ApiError::Internal(_) => {
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    "An internal error occurred".to_string()
                } else {
                    self.to_string()
                }
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            detail,
            code: Some(self.code().to_string()),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vpub_youtube::YouTubeError;

    #[test]
    fn test_pipeline_errors_map_to_status() {
        let cases = [
            (PipelineError::Busy, StatusCode::CONFLICT),
            (
                PipelineError::validation("title must not be empty"),
                StatusCode::BAD_REQUEST,
            ),
            (
                PipelineError::Catalog(YouTubeError::NotFound("abc".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                PipelineError::Catalog(YouTubeError::Unauthenticated("no token".into())),
                StatusCode::UNAUTHORIZED,
            ),
            (
                PipelineError::Catalog(YouTubeError::Timeout(30)),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                PipelineError::internal("boom"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_search_errors_map_to_status() {
        let err = ApiError::from(SearchError::Unauthorized("bad key".into()));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.code(), "unauthenticated");

        let err = ApiError::from(SearchError::validation("empty"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
