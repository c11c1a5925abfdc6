//! Axum HTTP API server.
//!
//! This crate provides:
//! - Image search and catalog REST endpoints
//! - A WebSocket that runs a publish and streams its events
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod paths;
pub mod routes;
pub mod state;
pub mod ws;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use paths::AllowedDirs;
pub use routes::create_router;
pub use state::AppState;
