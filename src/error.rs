//! Application error types and HTTP response mapping.
//!
//! Defines `AppError` for all failure conditions and implements Axum's
//! `IntoResponse` to automatically convert errors to appropriate HTTP
//! responses with JSON error bodies.
//!
//! Error mappings:
//! - `RepoNotFound` → 404
//! - `InvalidPath`, `InvalidPattern` → 400
//! - `DataSource`, `Internal` → 500

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Repository not found: {0}")]
    RepoNotFound(String),

    #[error("Blame data source failed: {0}")]
    DataSource(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid identifier pattern: {0}")]
    InvalidPattern(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::RepoNotFound(path) => {
                (StatusCode::NOT_FOUND, format!("Repository not found: {}", path))
            }
            AppError::DataSource(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Blame data source failed: {}", msg),
            ),
            AppError::InvalidPath(path) => {
                (StatusCode::BAD_REQUEST, format!("Invalid path: {}", path))
            }
            AppError::InvalidPattern(msg) => {
                (StatusCode::BAD_REQUEST, format!("Invalid identifier pattern: {}", msg))
            }
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
