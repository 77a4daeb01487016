use super::api_models::{ImportQuery, PageQuery, SearchQuery};
use super::session::Session;
use super::state::{GuardedCatalogStore, GuardedImporter, ServerState};
use super::stream_song::stream_song;
use crate::catalog_store::{Page, SongDraft, SongId, SongUpdate, SongView};
use crate::errors::{ServiceError, ServiceResult};
use crate::likes::{compose_view, compose_views};
use crate::songs;
use crate::spotify::DEFAULT_BULK_LIMIT;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct SongDeletedResponse {
    message: &'static str,
    deleted_likes_count: usize,
    song_id: SongId,
    song_title: String,
    song_artist: String,
}

#[derive(Serialize)]
struct SearchResponse {
    query: String,
    results: Vec<SongView>,
    count: usize,
}

#[derive(Serialize)]
struct SpotifyStatusResponse {
    status: &'static str,
    message: String,
}

async fn list_songs(
    session: Option<Session>,
    State(store): State<GuardedCatalogStore>,
    Query(query): Query<PageQuery>,
) -> ServiceResult<Json<Vec<SongView>>> {
    let songs = store.list_songs(query.page()?)?;
    Ok(Json(compose_views(
        store.as_ref(),
        songs,
        Session::viewer(session),
    )?))
}

async fn create_song(
    session: Session,
    State(store): State<GuardedCatalogStore>,
    Json(draft): Json<SongDraft>,
) -> ServiceResult<(StatusCode, Json<SongView>)> {
    let song = store.create_song(&draft)?;
    info!("User {} created song {}", session.user_id, song.id);
    let view = compose_view(store.as_ref(), song, Session::viewer(Some(session)))?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_song(
    session: Option<Session>,
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<SongId>,
) -> ServiceResult<Json<SongView>> {
    let song = store
        .get_song(id)?
        .ok_or_else(|| ServiceError::not_found("Song not found"))?;
    Ok(Json(compose_view(
        store.as_ref(),
        song,
        Session::viewer(session),
    )?))
}

async fn update_song(
    session: Session,
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<SongId>,
    Json(update): Json<SongUpdate>,
) -> ServiceResult<Json<SongView>> {
    let song = store.update_song(id, &update)?;
    Ok(Json(compose_view(
        store.as_ref(),
        song,
        Session::viewer(Some(session)),
    )?))
}

async fn delete_song(
    session: Session,
    State(state): State<ServerState>,
    Path(id): Path<SongId>,
) -> ServiceResult<Json<SongDeletedResponse>> {
    let deletion =
        songs::delete_song(state.catalog_store.as_ref(), &state.audio_cache, id).await?;
    info!(
        "User {} deleted song {} ({} likes removed)",
        session.user_id, id, deletion.deleted_likes_count
    );
    Ok(Json(SongDeletedResponse {
        message: "Song deleted successfully",
        deleted_likes_count: deletion.deleted_likes_count,
        song_id: deletion.song.id,
        song_title: deletion.song.title,
        song_artist: deletion.song.artist,
    }))
}

async fn search_songs(
    session: Option<Session>,
    State(store): State<GuardedCatalogStore>,
    Query(query): Query<SearchQuery>,
) -> ServiceResult<Json<SearchResponse>> {
    if query.q.trim().is_empty() {
        return Err(ServiceError::validation("q must not be empty"));
    }
    let page = Page::new(query.skip, query.limit)?;
    let songs = store.search_songs(&query.q, page)?;
    let results = compose_views(store.as_ref(), songs, Session::viewer(session))?;
    Ok(Json(SearchResponse {
        count: results.len(),
        query: query.q,
        results,
    }))
}

async fn import_from_spotify(
    session: Session,
    State(importer): State<GuardedImporter>,
    Query(query): Query<ImportQuery>,
) -> ServiceResult<(StatusCode, Json<SongView>)> {
    let view = importer
        .import_one(&query.query, Session::viewer(Some(session)))
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn bulk_import_from_spotify(
    session: Session,
    State(importer): State<GuardedImporter>,
    Query(query): Query<ImportQuery>,
) -> ServiceResult<(StatusCode, Json<Vec<SongView>>)> {
    let views = importer
        .import_bulk(
            &query.query,
            query.limit.unwrap_or(DEFAULT_BULK_LIMIT),
            Session::viewer(Some(session)),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(views)))
}

async fn test_spotify_connection(
    _session: Session,
    State(importer): State<GuardedImporter>,
) -> Json<SpotifyStatusResponse> {
    let response = match importer.provider().check_connection().await {
        Ok(()) => SpotifyStatusResponse {
            status: "connected",
            message: "Spotify API connection working".to_string(),
        },
        Err(err) => SpotifyStatusResponse {
            status: "error",
            message: err.to_string(),
        },
    };
    Json(response)
}

pub fn make_song_routes(state: ServerState) -> Router {
    Router::new()
        .route("/songs", get(list_songs).post(create_song))
        .route(
            "/songs/{id}",
            get(get_song).put(update_song).delete(delete_song),
        )
        .route("/songs/{id}/stream", get(stream_song))
        .route("/songs/search/query", get(search_songs))
        .route("/songs/import/spotify", post(import_from_spotify))
        .route("/songs/import/spotify/bulk", post(bulk_import_from_spotify))
        .route("/songs/test/spotify", get(test_spotify_connection))
        .with_state(state)
}
