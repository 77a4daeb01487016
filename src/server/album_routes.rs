use super::api_models::{MessageResponse, PageQuery};
use super::session::Session;
use super::state::{GuardedCatalogStore, ServerState};
use crate::catalog_store::{Album, AlbumDraft, AlbumId, AlbumUpdate, SongId, SongView};
use crate::errors::{ServiceError, ServiceResult};
use crate::likes::{compose_view, compose_views};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct AlbumWithSongs {
    #[serde(flatten)]
    album: Album,
    songs: Vec<SongView>,
}

#[derive(Serialize)]
struct AlbumDeletedResponse {
    #[serde(flatten)]
    message: MessageResponse,
    deleted_songs_count: usize,
}

async fn list_albums(
    State(store): State<GuardedCatalogStore>,
    Query(query): Query<PageQuery>,
) -> ServiceResult<Json<Vec<Album>>> {
    Ok(Json(store.list_albums(query.page()?)?))
}

async fn get_album(
    session: Option<Session>,
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<AlbumId>,
) -> ServiceResult<Json<AlbumWithSongs>> {
    let album = store
        .get_album(id)?
        .ok_or_else(|| ServiceError::not_found("Album not found"))?;
    let songs = compose_views(
        store.as_ref(),
        store.get_album_songs(id)?,
        Session::viewer(session),
    )?;
    Ok(Json(AlbumWithSongs { album, songs }))
}

async fn create_album(
    session: Session,
    State(store): State<GuardedCatalogStore>,
    Json(draft): Json<AlbumDraft>,
) -> ServiceResult<(StatusCode, Json<Album>)> {
    let album = store.create_album(&draft)?;
    info!("User {} created album {}", session.user_id, album.id);
    Ok((StatusCode::CREATED, Json(album)))
}

async fn update_album(
    _session: Session,
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<AlbumId>,
    Json(update): Json<AlbumUpdate>,
) -> ServiceResult<Json<Album>> {
    Ok(Json(store.update_album(id, &update)?))
}

async fn delete_album(
    session: Session,
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<AlbumId>,
) -> ServiceResult<Json<AlbumDeletedResponse>> {
    let deleted_songs_count = store.delete_album(id)?;
    info!(
        "User {} deleted album {} with {} songs",
        session.user_id, id, deleted_songs_count
    );
    Ok(Json(AlbumDeletedResponse {
        message: MessageResponse::new("Album deleted successfully"),
        deleted_songs_count,
    }))
}

async fn attach_song(
    session: Session,
    State(store): State<GuardedCatalogStore>,
    Path((id, song_id)): Path<(AlbumId, SongId)>,
) -> ServiceResult<Json<SongView>> {
    let song = store.attach_song_to_album(id, song_id)?;
    Ok(Json(compose_view(
        store.as_ref(),
        song,
        Session::viewer(Some(session)),
    )?))
}

pub fn make_album_routes(state: ServerState) -> Router {
    Router::new()
        .route("/albums", get(list_albums).post(create_album))
        .route(
            "/albums/{id}",
            get(get_album).put(update_album).delete(delete_album),
        )
        .route("/albums/{id}/songs/{song_id}", post(attach_song))
        .with_state(state)
}
