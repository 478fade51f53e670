//! Error types and error handling for the application
//!
//! This module defines custom error types that can be converted to HTTP responses.
//! All errors implement `IntoResponse` to provide consistent error formatting.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error types
///
/// Remote-agent failures never appear here: the agent bridge turns them into
/// reply text before they reach a handler.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request payload failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No verified identity accompanied the request
    #[error("Authentication required")]
    Unauthorized,

    /// Sign-in attempt was rejected
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Identity lacks the role required for the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Thread with the given ID was not found
    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    /// A message from the same user is still awaiting its reply
    #[error("A message is already being processed for this user")]
    Busy,

    /// Error occurred during state persistence
    #[error("Persistence error: {0}")]
    Persistence(#[from] crate::state::PersistenceError),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::ThreadNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Busy => StatusCode::CONFLICT,
            AppError::Persistence(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
