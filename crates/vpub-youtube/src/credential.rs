//! Credential stores.
//!
//! The OAuth handshake happens elsewhere; stores here only hand out whatever
//! token they hold. Nothing in this crate refreshes tokens.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;
use vpub_models::Credential;

use crate::error::{YouTubeError, YouTubeResult};

/// Source of platform credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Current credential, or `Unauthenticated` if none is stored.
    async fn get_credential(&self) -> YouTubeResult<Credential>;
}

/// Fetch a credential and reject it if blank or expired.
pub async fn usable_credential(store: &dyn CredentialStore) -> YouTubeResult<Credential> {
    let credential = store.get_credential().await?;
    if credential.access_token.is_empty() {
        return Err(YouTubeError::unauthenticated("access token is empty"));
    }
    if credential.is_expired() {
        return Err(YouTubeError::unauthenticated(format!(
            "access token expired at {}",
            credential.expires_at
        )));
    }
    Ok(credential)
}

// =============================================================================
// In-memory
// =============================================================================

/// Holds a credential in memory.
#[derive(Default)]
pub struct StaticCredentialStore {
    credential: RwLock<Option<Credential>>,
}

impl StaticCredentialStore {
    pub fn new(credential: Credential) -> Self {
        Self {
            credential: RwLock::new(Some(credential)),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub async fn set(&self, credential: Credential) {
        *self.credential.write().await = Some(credential);
    }

    pub async fn clear(&self) {
        *self.credential.write().await = None;
    }
}

#[async_trait]
impl CredentialStore for StaticCredentialStore {
    async fn get_credential(&self) -> YouTubeResult<Credential> {
        self.credential
            .read()
            .await
            .clone()
            .ok_or_else(|| YouTubeError::unauthenticated("no credential stored"))
    }
}

// =============================================================================
// Token file
// =============================================================================

/// Token JSON as written by Google OAuth client libraries.
#[derive(Debug, Deserialize)]
struct TokenFile {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    /// Unix epoch milliseconds
    #[serde(default)]
    expiry_date: Option<i64>,
}

/// Reads the token file written by the OAuth callback on every call, so a
/// re-authorization is picked up without restarting.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get_credential(&self) -> YouTubeResult<Credential> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(YouTubeError::unauthenticated(format!(
                    "no token file at {}",
                    self.path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let tokens: TokenFile = serde_json::from_str(&raw).map_err(|e| {
            YouTubeError::unauthenticated(format!("unreadable token file: {}", e))
        })?;

        let access_token = tokens
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| YouTubeError::unauthenticated("token file has no access token"))?;

        // Files without an expiry are trusted until the API rejects them.
        let expires_at = tokens
            .expiry_date
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        debug!(path = %self.path.display(), %expires_at, "Loaded credential from token file");

        let mut credential = Credential::new(access_token, expires_at);
        credential.refresh_token = tokens.refresh_token;
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_static_store() {
        let store = StaticCredentialStore::empty();
        assert!(matches!(
            store.get_credential().await,
            Err(YouTubeError::Unauthenticated(_))
        ));

        store.set(Credential::valid_for("tok", Duration::minutes(5))).await;
        assert_eq!(store.get_credential().await.unwrap().access_token, "tok");

        store.clear().await;
        assert!(store.get_credential().await.is_err());
    }

    #[tokio::test]
    async fn test_usable_credential_rejects_expired() {
        let store = StaticCredentialStore::new(Credential::valid_for("tok", Duration::minutes(-1)));
        let err = usable_credential(&store).await.unwrap_err();
        assert!(matches!(err, YouTubeError::Unauthenticated(ref m) if m.contains("expired")));
    }

    #[tokio::test]
    async fn test_file_store_reads_google_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let expiry = Utc::now() + Duration::hours(1);
        std::fs::write(
            &path,
            format!(
                r#"{{"access_token":"ya29.abc","refresh_token":"1//r","scope":"https://www.googleapis.com/auth/youtube","token_type":"Bearer","expiry_date":{}}}"#,
                expiry.timestamp_millis()
            ),
        )
        .unwrap();

        let store = FileCredentialStore::new(&path);
        let credential = usable_credential(&store).await.unwrap();
        assert_eq!(credential.access_token, "ya29.abc");
        assert_eq!(credential.refresh_token.as_deref(), Some("1//r"));
        assert_eq!(credential.expires_at.timestamp_millis(), expiry.timestamp_millis());
    }

    #[tokio::test]
    async fn test_file_store_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("absent.json"));
        assert!(matches!(
            store.get_credential().await,
            Err(YouTubeError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn test_file_store_expired_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, r#"{"access_token":"old","expiry_date":1000}"#).unwrap();

        let store = FileCredentialStore::new(&path);
        assert!(store.get_credential().await.is_ok());
        assert!(matches!(
            usable_credential(&store).await,
            Err(YouTubeError::Unauthenticated(_))
        ));
    }
}
