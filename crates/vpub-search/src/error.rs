//! Image search errors.

use thiserror::Error;
use vpub_models::ErrorKind;

/// Result type for image search.
pub type SearchResult<T> = Result<T, SearchError>;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Image search not authorized: {0}")]
    Unauthorized(String),

    #[error("Search request failed ({status}): {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Image download failed for {id}: {message}")]
    DownloadFailed { id: String, message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SearchError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn from_http_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Unauthorized(message),
            _ => Self::RequestFailed { status, message },
        }
    }

    pub fn transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err)
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::Validation(_) => ErrorKind::Validation,
            SearchError::Unauthorized(_) => ErrorKind::Unauthenticated,
            SearchError::Timeout => ErrorKind::Timeout,
            SearchError::Network(_) | SearchError::DownloadFailed { .. } => ErrorKind::Network,
            SearchError::RequestFailed { .. }
            | SearchError::InvalidResponse(_)
            | SearchError::Io(_) => ErrorKind::Unknown,
        }
    }
}
