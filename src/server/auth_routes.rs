use super::session::Session;
use super::state::{GuardedUserManager, ServerState};
use crate::errors::ServiceResult;
use crate::user::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, Registration, UserView,
};

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

async fn register(
    State(user_manager): State<GuardedUserManager>,
    Json(registration): Json<Registration>,
) -> ServiceResult<(StatusCode, Json<UserView>)> {
    let user = user_manager.register(&registration)?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(user_manager): State<GuardedUserManager>,
    Json(request): Json<LoginRequest>,
) -> ServiceResult<Json<LoginResponse>> {
    Ok(Json(user_manager.login(&request)?))
}

async fn refresh(
    State(user_manager): State<GuardedUserManager>,
    Json(request): Json<RefreshRequest>,
) -> ServiceResult<Json<RefreshResponse>> {
    Ok(Json(user_manager.refresh(&request.refresh_token)?))
}

async fn me(
    session: Session,
    State(user_manager): State<GuardedUserManager>,
) -> ServiceResult<Json<UserView>> {
    Ok(Json(user_manager.me(session.user_id)?))
}

pub fn make_auth_routes(state: ServerState) -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(me))
        .with_state(state)
}
