use crate::errors::ServiceError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    detail: String,
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Streaming(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Database(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = match &self {
            ServiceError::Database(_) | ServiceError::Internal(_) => {
                error!("Internal error: {:?}", self);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let mut response = (
            status,
            Json(ErrorBody {
                error: self.kind(),
                detail,
            }),
        )
            .into_response();
        if matches!(self, ServiceError::Unauthorized(_)) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
