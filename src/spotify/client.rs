//! Client for the Spotify Web API using the client-credentials flow.

use super::models::{SearchResponse, SpotifyTrack, TokenResponse};
use crate::errors::ServiceError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

pub const SPOTIFY_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
pub const MAX_SEARCH_LIMIT: usize = 50;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Tokens are renewed this long before Spotify says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum SpotifyError {
    #[error("Spotify client credentials are not configured")]
    NotConfigured,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<SpotifyError> for ServiceError {
    fn from(err: SpotifyError) -> Self {
        ServiceError::Upstream(format!("Error importing from Spotify: {}", err))
    }
}

/// Source of track search results for the importer.
#[async_trait]
pub trait TrackSearchProvider: Send + Sync {
    async fn search_tracks(&self, query: &str, limit: usize)
        -> Result<Vec<SpotifyTrack>, SpotifyError>;

    /// Verifies that credentials work and the API answers.
    async fn check_connection(&self) -> Result<(), SpotifyError>;
}

#[derive(Debug, Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

pub struct SpotifyClient {
    client: reqwest::Client,
    credentials: Option<SpotifyCredentials>,
    accounts_url: String,
    api_url: String,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyClient {
    pub fn new(credentials: Option<SpotifyCredentials>) -> Result<Self> {
        Self::with_base_urls(credentials, SPOTIFY_ACCOUNTS_URL, SPOTIFY_API_URL)
    }

    pub fn with_base_urls(
        credentials: Option<SpotifyCredentials>,
        accounts_url: &str,
        api_url: &str,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            credentials,
            accounts_url: accounts_url.trim_end_matches('/').to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token: Mutex::new(None),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    async fn access_token(&self) -> Result<String, SpotifyError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(SpotifyError::NotConfigured)?;

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        debug!("Requesting Spotify access token");
        let response = self
            .client
            .post(format!("{}/api/token", self.accounts_url))
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| SpotifyError::Connection(e.to_string()))?;
        let token: TokenResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| SpotifyError::InvalidResponse(e.to_string()))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, SpotifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(SpotifyError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl TrackSearchProvider for SpotifyClient {
    async fn search_tracks(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SpotifyTrack>, SpotifyError> {
        let token = self.access_token().await?;
        let limit = limit.clamp(1, MAX_SEARCH_LIMIT).to_string();

        let response = self
            .client
            .get(format!("{}/search", self.api_url))
            .bearer_auth(token)
            .query(&[("q", query), ("type", "track"), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(|e| SpotifyError::Connection(e.to_string()))?;
        let search: SearchResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| SpotifyError::InvalidResponse(e.to_string()))?;

        debug!(
            "Spotify search '{}' returned {} tracks",
            query,
            search.tracks.items.len()
        );
        Ok(search.tracks.items)
    }

    async fn check_connection(&self) -> Result<(), SpotifyError> {
        self.search_tracks("test", 1).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Query,
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn credentials() -> Option<SpotifyCredentials> {
        Some(SpotifyCredentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        })
    }

    async fn spawn_mock_spotify(token_hits: Arc<AtomicUsize>) -> String {
        let app = Router::new()
            .route(
                "/api/token",
                post(move || {
                    let hits = token_hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        Json(json!({
                            "access_token": "tok",
                            "token_type": "Bearer",
                            "expires_in": 3600
                        }))
                    }
                }),
            )
            .route(
                "/v1/search",
                get(
                    |headers: HeaderMap, Query(params): Query<HashMap<String, String>>| async move {
                        let authorized = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            == Some("Bearer tok");
                        if !authorized {
                            return StatusCode::UNAUTHORIZED.into_response();
                        }
                        if params.get("q").map(String::as_str) == Some("boom") {
                            return (StatusCode::BAD_GATEWAY, "upstream down").into_response();
                        }
                        Json(json!({
                            "tracks": {"items": [{
                                "name": params.get("q").cloned().unwrap_or_default(),
                                "artists": [{"name": "Artist"}],
                                "album": {"name": "Album", "images": [{"url": "https://img/1"}]},
                                "duration_ms": 200000,
                                "preview_url": null,
                                "external_urls": {"spotify": "https://open.spotify.com/track/1"}
                            }]}
                        }))
                        .into_response()
                    },
                ),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_trailing_slash_removal() {
        let client =
            SpotifyClient::with_base_urls(None, "http://accounts/", "http://api/v1/").unwrap();
        assert_eq!(client.accounts_url, "http://accounts");
        assert_eq!(client.api_url, "http://api/v1");
        assert!(!client.is_configured());
    }

    #[tokio::test]
    async fn search_without_credentials_fails() {
        let client = SpotifyClient::new(None).unwrap();
        let result = client.search_tracks("anything", 5).await;
        assert!(matches!(result, Err(SpotifyError::NotConfigured)));
    }

    #[tokio::test]
    async fn searches_and_reuses_token() {
        let token_hits = Arc::new(AtomicUsize::new(0));
        let base = spawn_mock_spotify(token_hits.clone()).await;
        let client =
            SpotifyClient::with_base_urls(credentials(), &base, &format!("{}/v1", base)).unwrap();

        let tracks = client.search_tracks("hello", 3).await.unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].name, "hello");
        assert_eq!(tracks[0].artists[0].name, "Artist");

        client.check_connection().await.unwrap();
        assert_eq!(token_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn surfaces_api_errors() {
        let token_hits = Arc::new(AtomicUsize::new(0));
        let base = spawn_mock_spotify(token_hits).await;
        let client =
            SpotifyClient::with_base_urls(credentials(), &base, &format!("{}/v1", base)).unwrap();

        match client.search_tracks("boom", 3).await {
            Err(SpotifyError::Api { status, message }) => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn converts_into_upstream_failure() {
        let err: ServiceError = SpotifyError::Connection("refused".to_string()).into();
        match err {
            ServiceError::Upstream(message) => assert!(message.contains("refused")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
