//! YouTube Data API v3 client.
//!
//! - [`Uploader`] streams a rendered video as a single multipart insert
//! - [`CatalogClient`] lists and deletes the account's videos
//! - [`CredentialStore`] supplies access tokens; this crate never refreshes them

pub mod catalog;
pub mod config;
pub mod credential;
pub mod error;
pub mod metrics;
pub mod types;
pub mod upload;

pub use catalog::CatalogClient;
pub use config::YouTubeConfig;
pub use credential::{usable_credential, CredentialStore, FileCredentialStore, StaticCredentialStore};
pub use error::{YouTubeError, YouTubeResult};
pub use upload::{validate_title, UploadRequest, Uploader};
