use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Server configuration error: {0}")]
    Config(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Authentication failed")]
    AuthError,
    #[error("Not found")]
    NotFound,
    #[error("Upstream error: {0}")]
    Upstream(String),
    #[error("Timed out: {0}")]
    Timeout(String),
    #[error("Session store error: {0}")]
    Store(String),
    #[error("Internal server error")]
    Internal,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Whether another attempt could plausibly succeed.
    /// Timeouts and store connectivity failures are transient; everything
    /// else is an explicit rejection.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Store(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Config(msg) => {
                tracing::error!(message = %msg, "Configuration error");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Server configuration error: {msg}"))
            }
            Self::BadRequest(msg) => {
                tracing::debug!(message = %msg, "Bad request");
                (StatusCode::BAD_REQUEST, msg)
            }
            Self::AuthError => {
                tracing::debug!("Authentication failed");
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }
            Self::NotFound => {
                tracing::debug!("Resource not found");
                (StatusCode::NOT_FOUND, "Not found".to_string())
            }
            Self::Upstream(msg) => {
                tracing::error!(message = %msg, "Upstream error");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Upstream error: {msg}"))
            }
            Self::Timeout(msg) => {
                tracing::warn!(message = %msg, "Timed out");
                (StatusCode::GATEWAY_TIMEOUT, format!("Timed out: {msg}"))
            }
            Self::Store(msg) => {
                tracing::error!(message = %msg, "Session store error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Session store unavailable".to_string())
            }
            Self::Internal => {
                tracing::error!("Internal server error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
