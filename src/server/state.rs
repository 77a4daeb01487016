use axum::extract::FromRef;

use crate::audio_cache::AudioCache;
use crate::catalog_store::CatalogStore;
use crate::likes::LikeService;
use crate::spotify::{SpotifyImporter, TrackSearchProvider};
use crate::user::UserManager;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::ServerConfig;

pub type GuardedCatalogStore = Arc<dyn CatalogStore>;
pub type GuardedAudioCache = Arc<AudioCache>;
pub type GuardedLikeService = Arc<LikeService>;
pub type GuardedImporter = Arc<SpotifyImporter>;
pub type GuardedUserManager = Arc<UserManager>;

const PROXY_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for proxied audio. `timeout` bounds connecting and each read, not
/// the whole transfer.
pub(crate) fn make_proxy_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(timeout)
        .read_timeout(timeout)
        .build()
        .context("Failed to create HTTP client")
}

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub catalog_store: GuardedCatalogStore,
    pub audio_cache: GuardedAudioCache,
    pub like_service: GuardedLikeService,
    pub importer: GuardedImporter,
    pub user_manager: GuardedUserManager,
    /// Used to proxy preview audio that is not cached locally.
    pub http_client: reqwest::Client,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        catalog_store: GuardedCatalogStore,
        audio_cache: GuardedAudioCache,
        search_provider: Arc<dyn TrackSearchProvider>,
        user_manager: GuardedUserManager,
    ) -> Result<ServerState> {
        let http_client = make_proxy_client(PROXY_TIMEOUT)?;
        Ok(ServerState {
            config,
            start_time: Instant::now(),
            like_service: Arc::new(LikeService::new(
                catalog_store.clone(),
                audio_cache.clone(),
            )),
            importer: Arc::new(SpotifyImporter::new(
                search_provider,
                catalog_store.clone(),
                audio_cache.clone(),
            )),
            catalog_store,
            audio_cache,
            user_manager,
            http_client,
        })
    }
}

impl FromRef<ServerState> for GuardedCatalogStore {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog_store.clone()
    }
}

impl FromRef<ServerState> for GuardedAudioCache {
    fn from_ref(input: &ServerState) -> Self {
        input.audio_cache.clone()
    }
}

impl FromRef<ServerState> for GuardedLikeService {
    fn from_ref(input: &ServerState) -> Self {
        input.like_service.clone()
    }
}

impl FromRef<ServerState> for GuardedImporter {
    fn from_ref(input: &ServerState) -> Self {
        input.importer.clone()
    }
}

impl FromRef<ServerState> for GuardedUserManager {
    fn from_ref(input: &ServerState) -> Self {
        input.user_manager.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
