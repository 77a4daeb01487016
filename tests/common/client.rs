//! HTTP client for end-to-end tests
//!
//! This module wraps reqwest and provides one method per server endpoint.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP test client with bearer-token authentication
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    /// Access token sent with every request, if any
    pub access_token: Option<String>,
}

impl TestClient {
    /// Creates a new unauthenticated client
    ///
    /// Use this for testing authentication flows and anonymous access.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            access_token: None,
        }
    }

    /// Creates a client for a freshly registered default test user
    ///
    /// # Panics
    ///
    /// Panics if registration or login fails (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String) -> Self {
        Self::authenticated_as(base_url, TEST_EMAIL, TEST_USERNAME).await
    }

    /// Registers `email`/`username` with `TEST_PASS` and logs in.
    pub async fn authenticated_as(base_url: String, email: &str, username: &str) -> Self {
        let mut client = Self::new(base_url);

        let response = client.register(email, username, TEST_PASS).await;
        assert_eq!(
            response.status(),
            StatusCode::CREATED,
            "Test user registration failed: {:?}",
            response.text().await
        );

        let response = client.login(email, TEST_PASS).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.expect("Invalid login response");
        client.access_token = Some(
            body["access_token"]
                .as_str()
                .expect("Missing access token")
                .to_string(),
        );

        client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get(&self, path: &str) -> Response {
        self.authorize(self.client.get(self.url(path)))
            .send()
            .await
            .expect("GET request failed")
    }

    async fn post(&self, path: &str, body: Option<&Value>) -> Response {
        let mut request = self.authorize(self.client.post(self.url(path)));
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.expect("POST request failed")
    }

    async fn put(&self, path: &str, body: &Value) -> Response {
        self.authorize(self.client.put(self.url(path)))
            .json(body)
            .send()
            .await
            .expect("PUT request failed")
    }

    async fn delete(&self, path: &str) -> Response {
        self.authorize(self.client.delete(self.url(path)))
            .send()
            .await
            .expect("DELETE request failed")
    }

    // ========================================================================
    // Service Endpoints
    // ========================================================================

    /// GET /
    pub async fn home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /auth/register
    pub async fn register(&self, email: &str, username: &str, password: &str) -> Response {
        self.post(
            "/auth/register",
            Some(&json!({
                "email": email,
                "username": username,
                "password": password,
            })),
        )
        .await
    }

    /// POST /auth/login
    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.post(
            "/auth/login",
            Some(&json!({ "email": email, "password": password })),
        )
        .await
    }

    /// POST /auth/refresh
    pub async fn refresh(&self, refresh_token: &str) -> Response {
        self.post(
            "/auth/refresh",
            Some(&json!({ "refresh_token": refresh_token })),
        )
        .await
    }

    /// GET /auth/me
    pub async fn me(&self) -> Response {
        self.get("/auth/me").await
    }

    // ========================================================================
    // Song Endpoints
    // ========================================================================

    /// GET /songs
    pub async fn list_songs(&self) -> Response {
        self.get("/songs").await
    }

    /// GET /songs?skip=&limit=
    pub async fn list_songs_page(&self, skip: usize, limit: usize) -> Response {
        self.get(&format!("/songs?skip={}&limit={}", skip, limit))
            .await
    }

    /// POST /songs
    pub async fn create_song(&self, song: &Value) -> Response {
        self.post("/songs", Some(song)).await
    }

    /// POST /songs, returning the created song's id
    pub async fn create_song_id(&self, song: &Value) -> i64 {
        let response = self.create_song(song).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await.expect("Invalid song response");
        body["id"].as_i64().expect("Missing song id")
    }

    /// GET /songs/{id}
    pub async fn get_song(&self, id: i64) -> Response {
        self.get(&format!("/songs/{}", id)).await
    }

    /// PUT /songs/{id}
    pub async fn update_song(&self, id: i64, update: &Value) -> Response {
        self.put(&format!("/songs/{}", id), update).await
    }

    /// DELETE /songs/{id}
    pub async fn delete_song(&self, id: i64) -> Response {
        self.delete(&format!("/songs/{}", id)).await
    }

    /// GET /songs/search/query?q=
    pub async fn search_songs(&self, query: &str) -> Response {
        self.authorize(self.client.get(self.url("/songs/search/query")))
            .query(&[("q", query)])
            .send()
            .await
            .expect("Search request failed")
    }

    /// GET /songs/{id}/stream, with an optional Range header value
    pub async fn stream_song(&self, id: i64, range: Option<&str>) -> Response {
        let mut request = self.authorize(self.client.get(self.url(&format!("/songs/{}/stream", id))));
        if let Some(range) = range {
            request = request.header(reqwest::header::RANGE, range);
        }
        request.send().await.expect("Stream request failed")
    }

    /// POST /songs/import/spotify?query=
    pub async fn import_from_spotify(&self, query: &str) -> Response {
        self.authorize(self.client.post(self.url("/songs/import/spotify")))
            .query(&[("query", query)])
            .send()
            .await
            .expect("Import request failed")
    }

    /// POST /songs/import/spotify/bulk?query=&limit=
    pub async fn bulk_import_from_spotify(&self, query: &str, limit: Option<usize>) -> Response {
        let mut request = self
            .authorize(self.client.post(self.url("/songs/import/spotify/bulk")))
            .query(&[("query", query)]);
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        request.send().await.expect("Bulk import request failed")
    }

    /// GET /songs/test/spotify
    pub async fn test_spotify(&self) -> Response {
        self.get("/songs/test/spotify").await
    }

    // ========================================================================
    // Like Endpoints
    // ========================================================================

    /// GET /likes
    pub async fn list_likes(&self) -> Response {
        self.get("/likes").await
    }

    /// POST /likes/{song_id}
    pub async fn like_song(&self, song_id: i64) -> Response {
        self.post(&format!("/likes/{}", song_id), None).await
    }

    /// POST /likes/with-data
    pub async fn like_song_with_data(&self, song: &Value) -> Response {
        self.post("/likes/with-data", Some(song)).await
    }

    /// DELETE /likes/{song_id}
    pub async fn unlike_song(&self, song_id: i64) -> Response {
        self.delete(&format!("/likes/{}", song_id)).await
    }

    // ========================================================================
    // Playlist Endpoints
    // ========================================================================

    /// POST /playlists
    pub async fn create_playlist(&self, name: &str, description: Option<&str>) -> Response {
        self.post(
            "/playlists",
            Some(&json!({ "name": name, "description": description })),
        )
        .await
    }

    /// GET /playlists
    pub async fn list_playlists(&self) -> Response {
        self.get("/playlists").await
    }

    /// GET /playlists/{id}
    pub async fn get_playlist(&self, id: i64) -> Response {
        self.get(&format!("/playlists/{}", id)).await
    }

    /// PUT /playlists/{id}
    pub async fn update_playlist(&self, id: i64, update: &Value) -> Response {
        self.put(&format!("/playlists/{}", id), update).await
    }

    /// DELETE /playlists/{id}
    pub async fn delete_playlist(&self, id: i64) -> Response {
        self.delete(&format!("/playlists/{}", id)).await
    }

    /// POST /playlists/{id}/songs/{song_id}
    pub async fn add_song_to_playlist(&self, id: i64, song_id: i64) -> Response {
        self.post(&format!("/playlists/{}/songs/{}", id, song_id), None)
            .await
    }

    /// DELETE /playlists/{id}/songs/{song_id}
    pub async fn remove_song_from_playlist(&self, id: i64, song_id: i64) -> Response {
        self.delete(&format!("/playlists/{}/songs/{}", id, song_id))
            .await
    }

    // ========================================================================
    // Album Endpoints
    // ========================================================================

    /// GET /albums
    pub async fn list_albums(&self) -> Response {
        self.get("/albums").await
    }

    /// POST /albums
    pub async fn create_album(&self, album: &Value) -> Response {
        self.post("/albums", Some(album)).await
    }

    /// GET /albums/{id}
    pub async fn get_album(&self, id: i64) -> Response {
        self.get(&format!("/albums/{}", id)).await
    }

    /// PUT /albums/{id}
    pub async fn update_album(&self, id: i64, update: &Value) -> Response {
        self.put(&format!("/albums/{}", id), update).await
    }

    /// DELETE /albums/{id}
    pub async fn delete_album(&self, id: i64) -> Response {
        self.delete(&format!("/albums/{}", id)).await
    }

    /// POST /albums/{id}/songs/{song_id}
    pub async fn attach_song_to_album(&self, id: i64, song_id: i64) -> Response {
        self.post(&format!("/albums/{}/songs/{}", id, song_id), None)
            .await
    }
}
