use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration};

use tracing::info;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::{
    album_routes::make_album_routes, auth_routes::make_auth_routes, like_routes::make_like_routes,
    log_requests, playlist_routes::make_playlist_routes, song_routes::make_song_routes, state::*,
    ServerConfig,
};
use crate::audio_cache::AudioCache;
use crate::catalog_store::CatalogStore;
use crate::spotify::TrackSearchProvider;
use crate::user::UserManager;

#[derive(Serialize)]
struct ServerStats {
    pub name: &'static str,
    pub version: &'static str,
    pub uptime: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    Json(ServerStats {
        name: "Music Catalog API",
        version: env!("CARGO_PKG_VERSION"),
        uptime: format_uptime(state.start_time.elapsed()),
    })
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "healthy" })
}

fn make_cors_layer(allowed_origins: &[String]) -> Result<CorsLayer> {
    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid allowed origin {:?}", origin))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::RANGE])
        .allow_credentials(true))
}

pub fn make_app(
    config: ServerConfig,
    catalog_store: Arc<dyn CatalogStore>,
    audio_cache: Arc<AudioCache>,
    search_provider: Arc<dyn TrackSearchProvider>,
    user_manager: Arc<UserManager>,
) -> Result<Router> {
    let cors = make_cors_layer(&config.allowed_origins)?;
    let state = ServerState::new(
        config.clone(),
        catalog_store,
        audio_cache,
        search_provider,
        user_manager,
    )?;

    let api_routes: Router = Router::new()
        .merge(make_auth_routes(state.clone()))
        .merge(make_song_routes(state.clone()))
        .merge(make_like_routes(state.clone()))
        .merge(make_playlist_routes(state.clone()))
        .merge(make_album_routes(state.clone()));

    let home_router: Router = Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .with_state(state.clone());

    let app = if config.api_prefix.is_empty() {
        home_router.merge(api_routes)
    } else {
        home_router.nest(&config.api_prefix, api_routes)
    };

    Ok(app
        .layer(middleware::from_fn_with_state(state, log_requests))
        .layer(cors))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

pub async fn run_server(
    config: ServerConfig,
    catalog_store: Arc<dyn CatalogStore>,
    audio_cache: Arc<AudioCache>,
    search_provider: Arc<dyn TrackSearchProvider>,
    user_manager: Arc<UserManager>,
) -> Result<()> {
    let port = config.port;
    let app = make_app(
        config,
        catalog_store,
        audio_cache,
        search_provider,
        user_manager,
    )?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
