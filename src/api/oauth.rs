use crate::api::AppState;
use crate::api::schemas::oauth::{ExchangeParams, ExchangeResponse};
use crate::domain::outcome::Outcome;
use crate::error::{AppError, Result};
use crate::services::exchange_service::CodeExchange;
use axum::{Json, extract::Query, extract::State, response::IntoResponse};

/// `GET /v1/oauth/exchange?code=...`
///
/// The browser lands here after the provider's consent screen redirects back
/// with an authorization code.
pub async fn exchange(
    State(state): State<AppState>,
    Query(params): Query<ExchangeParams>,
) -> Result<impl IntoResponse> {
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing code parameter".to_string()))?;

    let exchange = state.exchange_service.exchange(&code).await?;
    Ok(Json(map_exchange(exchange)?))
}

fn map_exchange(exchange: CodeExchange) -> Result<ExchangeResponse> {
    let (pages, warning) = match exchange.pages {
        Outcome::Ok(pages) => (pages, None),
        Outcome::Degraded { value, warning } => (value, Some(warning)),
        Outcome::Failed(e) => return Err(e),
    };

    Ok(ExchangeResponse {
        access_token: exchange.grant.access_token,
        expires_in: exchange.grant.expires_in.unwrap_or(0),
        pages,
        pages_error: warning.as_ref().map(|_| "Failed to fetch pages".to_string()),
        error_details: warning,
    })
}
