use crate::config::SocialConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{AppCredentials, GrantedPermission, Identity, Page, SocialGraph, TokenGrant};

/// Facebook Graph API adapter.
///
/// Token lifetime: ~60 days for the long-lived grant returned by the code
/// exchange. The redirect URI must byte-match the one registered with the
/// app, so it is fixed at construction.
#[derive(Debug, Clone)]
pub struct FacebookGraph {
    base_url: String,
    redirect_uri: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    error: Option<GraphError>,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    code: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: Vec<T>,
}

impl FacebookGraph {
    /// Builds the adapter with a bounded request timeout baked into the
    /// client, so every Graph call shares the same ceiling.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the HTTP client cannot be constructed.
    pub fn new(config: &SocialConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.exchange_timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("failed to build Graph API client: {e}")))?;

        Ok(Self {
            base_url: config.graph_base_url.trim_end_matches('/').to_string(),
            redirect_uri: config.redirect_uri.clone(),
            http,
        })
    }

    fn map_send_error(context: &str, e: &reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::Timeout(format!("{context} timed out"))
        } else {
            AppError::Upstream(format!("{context} failed: {e}"))
        }
    }
}

#[async_trait]
impl SocialGraph for FacebookGraph {
    #[tracing::instrument(skip(self, credentials, code), err(level = "warn"))]
    async fn exchange_code(&self, credentials: &AppCredentials, code: &str) -> Result<TokenGrant> {
        let response = self
            .http
            .get(format!("{}/oauth/access_token", self.base_url))
            .query(&[
                ("client_id", credentials.app_id.as_str()),
                ("client_secret", credentials.app_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("code", code),
            ])
            .send()
            .await
            .map_err(|e| Self::map_send_error("token endpoint request", &e))?;

        // The token endpoint answers 400 with an error object for a bad code.
        // That is a client problem, not an upstream one, so the body is read
        // regardless of status.
        let body: TokenEndpointResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("token endpoint returned malformed JSON: {e}")))?;

        match body.access_token {
            Some(access_token) => Ok(TokenGrant { access_token, expires_in: body.expires_in }),
            None => {
                if let Some(err) = body.error {
                    tracing::warn!(
                        message = err.message.as_deref().unwrap_or("unknown"),
                        kind = err.kind.as_deref().unwrap_or("unknown"),
                        code = err.code.unwrap_or_default(),
                        "Token endpoint rejected the authorization code"
                    );
                }
                Err(AppError::BadRequest("authorization code is invalid or has expired".to_string()))
            }
        }
    }

    #[tracing::instrument(skip(self, access_token), err(level = "warn"))]
    async fn list_pages(&self, access_token: &str) -> Result<Vec<Page>> {
        let envelope: DataEnvelope<Page> = self
            .http
            .get(format!("{}/me/accounts", self.base_url))
            .query(&[("access_token", access_token)])
            .send()
            .await
            .map_err(|e| Self::map_send_error("pages request", &e))?
            .error_for_status()
            .map_err(|e| AppError::Upstream(format!("pages request rejected: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("pages response was malformed: {e}")))?;

        Ok(envelope.data)
    }

    #[tracing::instrument(skip(self, access_token), err(level = "debug"))]
    async fn fetch_identity(&self, access_token: &str) -> Result<Identity> {
        self.http
            .get(format!("{}/me", self.base_url))
            .query(&[("fields", "id,name"), ("access_token", access_token)])
            .send()
            .await
            .map_err(|e| Self::map_send_error("identity request", &e))?
            .error_for_status()
            .map_err(|e| AppError::Upstream(format!("identity request rejected: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("identity response was malformed: {e}")))
    }

    #[tracing::instrument(skip(self, access_token), err(level = "debug"))]
    async fn fetch_permissions(&self, access_token: &str) -> Result<Vec<GrantedPermission>> {
        let envelope: DataEnvelope<GrantedPermission> = self
            .http
            .get(format!("{}/me/permissions", self.base_url))
            .query(&[("access_token", access_token)])
            .send()
            .await
            .map_err(|e| Self::map_send_error("permissions request", &e))?
            .error_for_status()
            .map_err(|e| AppError::Upstream(format!("permissions request rejected: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("permissions response was malformed: {e}")))?;

        Ok(envelope.data)
    }
}
