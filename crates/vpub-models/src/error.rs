//! Error kinds shared by every pipeline component.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for model construction and state transitions.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building or mutating models.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid state transition for {entity}: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },
}

impl ModelError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ModelError::Validation(_) => ErrorKind::Validation,
            ModelError::InvalidTransition { .. } => ErrorKind::Unknown,
        }
    }
}

/// Coarse error classification surfaced to callers.
///
/// Every component error maps onto exactly one kind so the caller can tell
/// bad input apart from auth problems, missing remote entities and transport
/// failures without matching on crate-specific enums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad input shape (empty image set, non-positive duration, bad title)
    Validation,
    /// A referenced local file is absent
    MissingInput,
    /// No credential, or the credential is expired or rejected
    Unauthenticated,
    /// The remote entity does not exist
    NotFound,
    /// Transport failure
    Network,
    /// A bounded operation ran out of time
    Timeout,
    /// The render backend failed
    Encoding,
    /// The caller aborted the operation
    Cancelled,
    /// Anything else
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::MissingInput => "missing_input",
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Encoding => "encoding",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
