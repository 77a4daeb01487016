//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own data directory and database.

use super::constants::*;
use super::fixtures::FakeSpotify;
use music_catalog_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use music_catalog_server::{
    AudioCache, SqliteCatalogStore, SqliteUserStore, TokenIssuer, UserManager,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with an isolated data directory
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    temp_data_dir: TempDir,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if the database can't be created, the port can't be bound or
    /// the server doesn't become ready within the timeout.
    pub async fn spawn() -> Self {
        let temp_data_dir = TempDir::new().expect("Failed to create temp data dir");

        let catalog_store = Arc::new(
            SqliteCatalogStore::new(temp_data_dir.path().join("catalog.db"))
                .expect("Failed to open catalog store"),
        );
        let user_store = Arc::new(SqliteUserStore::from_connection(
            catalog_store.connection(),
        ));
        let tokens = TokenIssuer::new(
            "e2e-test-secret",
            chrono::Duration::minutes(30),
            chrono::Duration::days(7),
        );
        let user_manager = Arc::new(UserManager::new(user_store, tokens));
        let audio_cache = Arc::new(
            AudioCache::new(temp_data_dir.path(), AUDIO_STORAGE_DIR)
                .expect("Failed to create audio cache"),
        );

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            api_prefix: API_PREFIX.to_string(),
            allowed_origins: vec!["*".to_string()],
        };

        let app = make_app(
            config,
            catalog_store,
            audio_cache,
            Arc::new(FakeSpotify),
            user_manager,
        )
        .expect("Failed to build app");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            temp_data_dir,
            shutdown_tx: Some(shutdown_tx),
        };
        server.wait_for_ready().await;
        server
    }

    /// Writes `bytes` into the audio storage directory and returns the
    /// storage-relative path to store in a song's `local_file_path`.
    pub fn write_audio_file(&self, file_name: &str, bytes: &[u8]) -> String {
        let dir: PathBuf = self.temp_data_dir.path().join(AUDIO_STORAGE_DIR);
        std::fs::create_dir_all(&dir).expect("Failed to create audio dir");
        std::fs::write(dir.join(file_name), bytes).expect("Failed to write audio file");
        format!("{}/{}", AUDIO_STORAGE_DIR, file_name)
    }

    /// Waits for the server to become ready by polling the /health endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/health", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
