//! services/api/src/error.rs
//!
//! Defines the error types of the API service: `ApiError` for startup and the
//! binaries, `HandlerError` for failures rendered as HTTP responses.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cats_core::ports::PortError;
use serde_json::json;
use tracing::error;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents an error from the outbound HTTP client.
    #[error("HTTP client Error: {0}")]
    Http(#[from] reqwest::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

//=========================================================================================
// Handler Errors
//=========================================================================================

/// Detail of an internal failure, attached to the 500 response so that the
/// error-rendering middleware can decide how much of it to show.
#[derive(Clone, Debug)]
pub struct InternalDetail(pub String);

/// Body text of a 500 response when details are hidden.
pub const GENERIC_INTERNAL_MESSAGE: &str = "Something went wrong";

/// An error returned by a request handler.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{message} (id {id})")]
    Conflict { message: String, id: i64 },
    #[error("{0}")]
    Internal(String),
}

impl HandlerError {
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HandlerError::NotFound(_) => StatusCode::NOT_FOUND,
            HandlerError::Conflict { .. } => StatusCode::CONFLICT,
            HandlerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PortError> for HandlerError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(msg) => HandlerError::NotFound(msg),
            PortError::Invalid(msg) => HandlerError::BadRequest(msg),
            PortError::Conflict { existing_id } => HandlerError::Conflict {
                message: "Already exists".to_string(),
                id: existing_id,
            },
            PortError::Upstream { status, body } => {
                HandlerError::Internal(format!("CatAPI error: {} - {}", status, body))
            }
            PortError::Unexpected(msg) => HandlerError::Internal(msg),
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            HandlerError::BadRequest(msg) | HandlerError::NotFound(msg) => {
                (status, Json(json!({ "error": msg }))).into_response()
            }
            HandlerError::Conflict { message, id } => {
                (status, Json(json!({ "error": message, "id": id }))).into_response()
            }
            HandlerError::Internal(detail) => {
                error!("Request failed: {}", detail);
                let mut response = (status, Json(internal_body(GENERIC_INTERNAL_MESSAGE))).into_response();
                response.extensions_mut().insert(InternalDetail(detail));
                response
            }
        }
    }
}

pub fn internal_body(message: &str) -> serde_json::Value {
    json!({
        "error": "Internal Server Error",
        "message": message,
    })
}
