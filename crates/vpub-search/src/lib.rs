//! Image search for the publish pipeline.
//!
//! [`ImageSearch`] is the boundary the API layer talks to; [`UnsplashClient`]
//! implements it by querying Unsplash and staging each hit on local disk.

pub mod config;
pub mod error;
pub mod unsplash;

use async_trait::async_trait;
use vpub_models::ImageRef;

pub use config::UnsplashConfig;
pub use error::{SearchError, SearchResult};
pub use unsplash::UnsplashClient;

/// Finds images for a query and stages them locally.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// Staged images in relevance order.
    async fn search(&self, query: &str) -> SearchResult<Vec<ImageRef>>;
}
