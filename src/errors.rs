//! Error taxonomy shared by the catalog, like, import and auth layers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Validation(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Error streaming audio: {0}")]
    Streaming(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    pub fn not_found<S: Into<String>>(what: S) -> Self {
        ServiceError::NotFound(what.into())
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        ServiceError::Validation(message.into())
    }

    /// Short machine-readable classification used in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Forbidden(_) => "forbidden",
            ServiceError::Unauthorized(_) => "unauthorized",
            ServiceError::Validation(_) => "validation",
            ServiceError::Upstream(_) => "upstream_failure",
            ServiceError::Streaming(_) => "streaming_failure",
            ServiceError::Database(_) | ServiceError::Internal(_) => "internal",
        }
    }
}
