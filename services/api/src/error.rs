//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how it is
//! turned into an HTTP response.

use crate::config::ConfigError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lehrjournal_core::{PortError, ServiceError};
use serde::Serialize;
use utoipa::ToSchema;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// A workflow failure carrying one of the callable error kinds.
    #[error("{0}")]
    Service(#[from] ServiceError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents an error from running the schema migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The error body every endpoint returns.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// One of `unauthenticated`, `permission-denied`, `invalid-argument`,
    /// `not-found`, `internal`.
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn unauthenticated() -> Self {
        ApiError::Service(ServiceError::Unauthenticated("Not signed in".to_string()))
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        ApiError::Service(ServiceError::invalid(msg))
    }

    pub fn denied(msg: impl Into<String>) -> Self {
        ApiError::Service(ServiceError::denied(msg))
    }

    fn status_and_body(&self) -> (StatusCode, ErrorBody) {
        let service = match self {
            ApiError::Service(e) => Some(e),
            _ => None,
        };
        let port = match self {
            ApiError::Port(PortError::NotFound(msg)) => {
                Some(ServiceError::NotFound(msg.clone()))
            }
            ApiError::Port(PortError::Unauthorized) => Some(ServiceError::Unauthenticated(
                "Not signed in".to_string(),
            )),
            _ => None,
        };

        let (status, code, message) = match service.or(port.as_ref()) {
            Some(ServiceError::Unauthenticated(m)) => (StatusCode::UNAUTHORIZED, "unauthenticated", m.clone()),
            Some(ServiceError::PermissionDenied(m)) => (StatusCode::FORBIDDEN, "permission-denied", m.clone()),
            Some(ServiceError::InvalidArgument(m)) => (StatusCode::BAD_REQUEST, "invalid-argument", m.clone()),
            Some(ServiceError::NotFound(m)) => (StatusCode::NOT_FOUND, "not-found", m.clone()),
            Some(ServiceError::Internal(m)) => {
                tracing::error!("Internal error: {}", m);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", "An internal error occurred".to_string())
            }
            None => {
                tracing::error!("Internal error: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", "An internal error occurred".to_string())
            }
        };
        (
            status,
            ErrorBody {
                code: code.to_string(),
                message,
            },
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

// Malformed requests carry axum's explanation as the message.

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::invalid(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::invalid(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
