use super::state::ServerState;
use crate::catalog_store::LikeViewer;
use crate::errors::ServiceError;
use crate::user::UserId;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::convert::Infallible;
use tracing::debug;

/// The authenticated caller. Extracting `Session` rejects unauthenticated
/// requests, `Option<Session>` turns any token problem into None.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
}

impl Session {
    pub fn viewer(session: Option<Session>) -> LikeViewer {
        session.map(|s| s.user_id).into()
    }
}

async fn extract_session_from_request_parts(
    parts: &mut Parts,
    ctx: &ServerState,
) -> Result<Session, ServiceError> {
    let TypedHeader(Authorization(bearer)) =
        <TypedHeader<Authorization<Bearer>> as FromRequestParts<ServerState>>::from_request_parts(
            parts, ctx,
        )
        .await
        .map_err(|err| {
            debug!("No bearer token: {}", err);
            ServiceError::Unauthorized("Not authenticated".to_string())
        })?;

    let user_id = ctx
        .user_manager
        .authenticate(bearer.token())
        .ok_or_else(|| ServiceError::Unauthorized("Could not validate credentials".to_string()))?;
    debug!("Authenticated user_id={}", user_id);
    Ok(Session { user_id })
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx).await
    }
}

impl OptionalFromRequestParts<ServerState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(extract_session_from_request_parts(parts, ctx).await.ok())
    }
}
