//! Catalog of videos owned by the authenticated account.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use tracing::{debug, info, info_span, Instrument};
use vpub_models::CatalogEntry;

use crate::config::YouTubeConfig;
use crate::credential::{usable_credential, CredentialStore};
use crate::error::{YouTubeError, YouTubeResult};
use crate::metrics::record_request;
use crate::types::{SearchListResponse, VideoListResponse};

/// Lists and deletes remote videos. Never caches: every call reads the
/// platform, which is the source of truth.
#[derive(Clone)]
pub struct CatalogClient {
    http: Client,
    config: YouTubeConfig,
    credentials: Arc<dyn CredentialStore>,
}

impl CatalogClient {
    pub fn new(config: YouTubeConfig, credentials: Arc<dyn CredentialStore>) -> YouTubeResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(4)
            .user_agent(concat!("vpub-youtube/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(YouTubeError::Network)?;

        Ok(Self {
            http,
            config,
            credentials,
        })
    }

    /// Most recent videos, newest first.
    pub async fn list(&self) -> YouTubeResult<Vec<CatalogEntry>> {
        self.execute("list", None, async {
            let credential = usable_credential(self.credentials.as_ref()).await?;
            let token = credential.access_token.as_str();

            let search_url = format!("{}/search", self.config.api_base_url);
            let page_size = self.config.catalog_page_size.to_string();
            let response = self
                .http
                .get(&search_url)
                .bearer_auth(token)
                .query(&[
                    ("part", "id"),
                    ("forMine", "true"),
                    ("type", "video"),
                    ("order", "date"),
                    ("maxResults", page_size.as_str()),
                ])
                .send()
                .await
                .map_err(|e| self.transport(e))?;
            let search: SearchListResponse = self.read_json(response).await?;

            let ids = search.video_ids();
            if ids.is_empty() {
                return Ok(Vec::new());
            }

            let videos_url = format!("{}/videos", self.config.api_base_url);
            let joined = ids.join(",");
            let response = self
                .http
                .get(&videos_url)
                .bearer_auth(token)
                .query(&[("part", "snippet,statistics"), ("id", joined.as_str())])
                .send()
                .await
                .map_err(|e| self.transport(e))?;
            let videos: VideoListResponse = self.read_json(response).await?;

            // Keep the date order from search; drop ids the details call
            // no longer knows about.
            let mut by_id: HashMap<String, CatalogEntry> = videos
                .items
                .into_iter()
                .map(|v| (v.id.clone(), CatalogEntry::from(v)))
                .collect();
            let entries: Vec<CatalogEntry> =
                ids.iter().filter_map(|id| by_id.remove(id)).collect();

            debug!(count = entries.len(), "Catalog listed");
            Ok(entries)
        })
        .await
    }

    /// Delete a video by its remote id.
    pub async fn delete(&self, remote_id: &str) -> YouTubeResult<()> {
        let remote_id = remote_id.trim();
        if remote_id.is_empty() {
            return Err(YouTubeError::validation("video id must not be empty"));
        }

        self.execute("delete", Some(remote_id), async {
            let credential = usable_credential(self.credentials.as_ref()).await?;
            let url = format!("{}/videos", self.config.api_base_url);

            let response = self
                .http
                .delete(&url)
                .bearer_auth(&credential.access_token)
                .query(&[("id", remote_id)])
                .send()
                .await
                .map_err(|e| self.transport(e))?;

            match response.status() {
                StatusCode::NO_CONTENT | StatusCode::OK => {
                    info!(remote_id, "Video deleted");
                    Ok(())
                }
                status => {
                    let body = response.text().await.unwrap_or_default();
                    Err(YouTubeError::from_http_status(status.as_u16(), body))
                }
            }
        })
        .await
    }

    fn transport(&self, err: reqwest::Error) -> YouTubeError {
        YouTubeError::transport(err, self.config.timeout)
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> YouTubeResult<T> {
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport(e))?;
        if !status.is_success() {
            return Err(YouTubeError::from_http_status(status.as_u16(), body));
        }
        serde_json::from_str(&body).map_err(|e| YouTubeError::invalid_response(e.to_string()))
    }

    async fn execute<T, F>(&self, operation: &'static str, remote_id: Option<&str>, fut: F) -> YouTubeResult<T>
    where
        F: Future<Output = YouTubeResult<T>>,
    {
        let span = match remote_id {
            Some(id) => info_span!("youtube_request", operation, remote_id = %id),
            None => info_span!("youtube_request", operation),
        };

        let start = Instant::now();
        let result = fut.instrument(span).await;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(0),
        };
        record_request(operation, status, start.elapsed().as_secs_f64());

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::StaticCredentialStore;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;
    use vpub_models::{Credential, ErrorKind};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> CatalogClient {
        CatalogClient::new(
            YouTubeConfig::with_base_url(&server.uri()),
            Arc::new(StaticCredentialStore::new(Credential::valid_for(
                "test-token",
                ChronoDuration::minutes(30),
            ))),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_list_keeps_search_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/search"))
            .and(query_param("forMine", "true"))
            .and(query_param("order", "date"))
            .and(query_param("maxResults", "10"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"id": {"kind": "youtube#video", "videoId": "new"}},
                    {"id": {"kind": "youtube#video", "videoId": "old"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/videos"))
            .and(query_param("id", "new,old"))
            .and(query_param("part", "snippet,statistics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"id": "old", "snippet": {"title": "Old"}, "statistics": {"viewCount": "5"}},
                    {"id": "new", "snippet": {"title": "New"}, "statistics": {"viewCount": "1", "likeCount": "1"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let entries = client(&server).list().await.unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.remote_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert_eq!(entries[1].view_count, 5);
        assert_eq!(entries[0].like_count, 1);
    }

    #[tokio::test]
    async fn test_list_empty_skips_details() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/videos"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        assert!(client(&server).list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"code": 401, "message": "Invalid Credentials", "errors": [{"reason": "authError"}]}
            })))
            .mount(&server)
            .await;

        let err = client(&server).list().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
    }

    #[tokio::test]
    async fn test_delete_then_delete_again() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/youtube/v3/videos"))
            .and(query_param("id", "abc"))
            .respond_with(ResponseTemplate::new(204))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/youtube/v3/videos"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": 404, "message": "Video not found", "errors": [{"reason": "videoNotFound"}]}
            })))
            .mount(&server)
            .await;

        let client = client(&server);
        client.delete("abc").await.unwrap();
        let err = client.delete("abc").await.unwrap_err();
        assert!(matches!(err, YouTubeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_empty_id() {
        let server = MockServer::start().await;
        let err = client(&server).delete("  ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_timeout_is_distinct() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let mut config = YouTubeConfig::with_base_url(&server.uri());
        config.timeout = Duration::from_secs(1);
        let client = CatalogClient::new(
            config,
            Arc::new(StaticCredentialStore::new(Credential::valid_for(
                "test-token",
                ChronoDuration::minutes(30),
            ))),
        )
        .unwrap();

        let err = client.delete("abc").await.unwrap_err();
        assert!(matches!(err, YouTubeError::Timeout(1)));
    }
}
