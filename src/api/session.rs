use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::session::{CurrentUserResponse, RefreshResponse, SessionResponse};
use crate::error::Result;
use axum::{Json, extract::State, response::IntoResponse};

/// `GET /v1/session`
///
/// Resolves the caller's session through the bounded retry so the lookup
/// survives the consistency window right after an OAuth redirect.
pub async fn get_session(auth: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let client = state.session_client(auth.claims);
    let session = client
        .get_session_with_retry(state.config.session_retry_max_elapsed(), state.config.session_retry_initial_delay())
        .await?;

    Ok(Json(SessionResponse {
        user_id: session.user_id,
        expires_at: session.expires_at.unix_timestamp(),
    }))
}

/// `POST /v1/session/refresh`
///
/// A rejected refresh is a normal outcome (`refreshed: false`), not a 5xx;
/// the dashboard falls back to its signed-out state.
pub async fn refresh(auth: AuthUser, State(state): State<AppState>) -> impl IntoResponse {
    let client = state.session_client(auth.claims);
    Json(RefreshResponse { refreshed: client.refresh_token().await })
}

/// `GET /v1/me`
pub async fn me(auth: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let client = state.session_client(auth.claims);
    let (user, warning) = client.current_user().await.into_parts()?;

    Ok(Json(CurrentUserResponse {
        id: user.id,
        email: user.email,
        role: user.role,
        created_at: user.created_at,
        last_sign_in: user.last_sign_in,
        authenticated_status: user.authenticated_status,
        profile_warning: warning,
    }))
}
