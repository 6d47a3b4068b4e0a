use crate::api::AppState;
use crate::api::schemas::maintenance::CleanupResponse;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

/// `/v1/maintenance/session-cleanup` (any method)
///
/// Entry point for the external scheduler. The response body always carries
/// the `{status, message}` shape the scheduler's alerting expects, so errors
/// are mapped here instead of bubbling through `AppError`.
pub async fn session_cleanup(State(state): State<AppState>) -> impl IntoResponse {
    match state.cleanup_service.sweep_expired().await {
        Ok(count) => (
            StatusCode::OK,
            Json(CleanupResponse {
                status: "success".to_string(),
                message: format!("Cleaned up {count} expired sessions"),
                error: None,
            }),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(CleanupResponse {
                status: "error".to_string(),
                message: "Session cleanup failed".to_string(),
                error: Some(e.to_string()),
            }),
        ),
    }
}
