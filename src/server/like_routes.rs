use super::api_models::{MessageResponse, PageQuery};
use super::session::Session;
use super::state::{GuardedLikeService, ServerState};
use crate::catalog_store::{SongDraft, SongId, SongView};
use crate::errors::ServiceResult;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

async fn like_song(
    session: Session,
    State(likes): State<GuardedLikeService>,
    Path(song_id): Path<SongId>,
) -> ServiceResult<(StatusCode, Json<SongView>)> {
    let view = likes.like(song_id, session.user_id)?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn like_song_with_data(
    session: Session,
    State(likes): State<GuardedLikeService>,
    Json(draft): Json<SongDraft>,
) -> ServiceResult<(StatusCode, Json<SongView>)> {
    let view = likes.like_with_data(&draft, session.user_id).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn unlike_song(
    session: Session,
    State(likes): State<GuardedLikeService>,
    Path(song_id): Path<SongId>,
) -> ServiceResult<Json<MessageResponse>> {
    likes.unlike(song_id, session.user_id)?;
    Ok(Json(MessageResponse::new("Song unliked successfully")))
}

async fn list_likes(
    session: Session,
    State(likes): State<GuardedLikeService>,
    Query(query): Query<PageQuery>,
) -> ServiceResult<Json<Vec<SongView>>> {
    Ok(Json(likes.list_likes(session.user_id, query.page()?)?))
}

pub fn make_like_routes(state: ServerState) -> Router {
    Router::new()
        .route("/likes", get(list_likes))
        .route("/likes/with-data", post(like_song_with_data))
        .route("/likes/{song_id}", post(like_song).delete(unlike_song))
        .with_state(state)
}
