use super::api_models::{MessageResponse, PageQuery};
use super::session::Session;
use super::state::{GuardedCatalogStore, ServerState};
use crate::catalog_store::{
    CatalogStore, LikeViewer, Playlist, PlaylistDraft, PlaylistId, PlaylistUpdate, SongId,
    SongView,
};
use crate::errors::{ServiceError, ServiceResult};
use crate::likes::compose_views;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct PlaylistWithSongs {
    #[serde(flatten)]
    playlist: Playlist,
    songs: Vec<SongView>,
}

fn playlist_with_songs(
    store: &dyn CatalogStore,
    id: PlaylistId,
    viewer: LikeViewer,
) -> ServiceResult<PlaylistWithSongs> {
    let playlist = store
        .get_playlist(id)?
        .ok_or_else(|| ServiceError::not_found("Playlist not found"))?;
    let songs = compose_views(store, store.get_playlist_songs(id)?, viewer)?;
    Ok(PlaylistWithSongs { playlist, songs })
}

async fn create_playlist(
    session: Session,
    State(store): State<GuardedCatalogStore>,
    Json(draft): Json<PlaylistDraft>,
) -> ServiceResult<(StatusCode, Json<Playlist>)> {
    let playlist = store.create_playlist(session.user_id, &draft)?;
    info!(
        "User {} created playlist {}",
        session.user_id, playlist.id
    );
    Ok((StatusCode::CREATED, Json(playlist)))
}

async fn list_playlists(
    session: Session,
    State(store): State<GuardedCatalogStore>,
    Query(query): Query<PageQuery>,
) -> ServiceResult<Json<Vec<Playlist>>> {
    Ok(Json(
        store.list_user_playlists(session.user_id, query.page()?)?,
    ))
}

async fn get_playlist(
    session: Session,
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<PlaylistId>,
) -> ServiceResult<Json<PlaylistWithSongs>> {
    Ok(Json(playlist_with_songs(
        store.as_ref(),
        id,
        Session::viewer(Some(session)),
    )?))
}

async fn update_playlist(
    session: Session,
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<PlaylistId>,
    Json(update): Json<PlaylistUpdate>,
) -> ServiceResult<Json<Playlist>> {
    Ok(Json(store.update_playlist(id, session.user_id, &update)?))
}

async fn delete_playlist(
    session: Session,
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<PlaylistId>,
) -> ServiceResult<Json<MessageResponse>> {
    store.delete_playlist(id, session.user_id)?;
    info!("User {} deleted playlist {}", session.user_id, id);
    Ok(Json(MessageResponse::new("Playlist deleted successfully")))
}

async fn add_song(
    session: Session,
    State(store): State<GuardedCatalogStore>,
    Path((id, song_id)): Path<(PlaylistId, SongId)>,
) -> ServiceResult<Json<PlaylistWithSongs>> {
    store.add_song_to_playlist(id, song_id, session.user_id)?;
    Ok(Json(playlist_with_songs(
        store.as_ref(),
        id,
        Session::viewer(Some(session)),
    )?))
}

async fn remove_song(
    session: Session,
    State(store): State<GuardedCatalogStore>,
    Path((id, song_id)): Path<(PlaylistId, SongId)>,
) -> ServiceResult<Json<MessageResponse>> {
    store.remove_song_from_playlist(id, song_id, session.user_id)?;
    Ok(Json(MessageResponse::new(
        "Song removed from playlist successfully",
    )))
}

pub fn make_playlist_routes(state: ServerState) -> Router {
    Router::new()
        .route("/playlists", get(list_playlists).post(create_playlist))
        .route(
            "/playlists/{id}",
            get(get_playlist)
                .put(update_playlist)
                .delete(delete_playlist),
        )
        .route(
            "/playlists/{id}/songs/{song_id}",
            post(add_song).delete(remove_song),
        )
        .with_state(state)
}
