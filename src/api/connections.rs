use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::connections::{ConnectionResponse, CreateConnection};
use crate::domain::connection::SocialConnection;
use crate::error::Result;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

/// `GET /v1/connections`
pub async fn list(auth: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let connections = state.connection_service.list(auth.claims.sub).await?;
    Ok(Json(connections.into_iter().map(map_connection).collect::<Vec<_>>()))
}

/// `POST /v1/connections`
///
/// Called by the dashboard after a successful exchange, with the page or
/// business account the user picked.
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateConnection>,
) -> Result<impl IntoResponse> {
    let created = state
        .connection_service
        .create(auth.claims.sub, payload.fb_page_id, payload.ig_account_id)
        .await?;
    Ok((StatusCode::CREATED, Json(map_connection(created))))
}

/// `DELETE /v1/connections/{id}`
pub async fn remove(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.connection_service.remove(auth.claims.sub, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn map_connection(connection: SocialConnection) -> ConnectionResponse {
    ConnectionResponse {
        id: connection.id,
        user_id: connection.user_id,
        fb_page_id: connection.fb_page_id,
        ig_account_id: connection.ig_account_id,
        created_at: connection.created_at,
    }
}
