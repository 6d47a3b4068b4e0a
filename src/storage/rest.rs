use crate::config::StoreConfig;
use crate::domain::connection::{NewConnection, SocialConnection};
use crate::domain::session::Session;
use crate::domain::user::UserProfile;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use super::SessionStore;

/// REST adapter for the hosted backend. Data rows go through the PostgREST
/// surface (`/rest/v1`), token operations through the identity provider
/// (`/auth/v1`). The privileged service key authorizes row access; the
/// anonymous key is all the token endpoint needs.
#[derive(Debug, Clone)]
pub struct RestStore {
    base_url: String,
    anon_key: String,
    service_key: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: RefreshUser,
}

#[derive(Debug, Deserialize)]
struct RefreshUser {
    id: Uuid,
}

impl RestStore {
    /// # Errors
    /// Returns `AppError::Config` if the HTTP client cannot be constructed.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| AppError::Config(format!("failed to build store client: {e}")))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            service_key: config.service_key.clone(),
            http,
        })
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn privileged(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
    }

    fn map_send_error(context: &str, e: &reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::Timeout(format!("{context} timed out"))
        } else {
            AppError::Store(format!("{context} failed: {e}"))
        }
    }

    async fn read_rows<T: serde::de::DeserializeOwned>(
        context: &str,
        response: reqwest::Response,
    ) -> Result<Vec<T>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Store(format!("{context} returned {status}: {body}")));
        }
        response
            .json()
            .await
            .map_err(|e| AppError::Store(format!("{context} returned malformed rows: {e}")))
    }
}

#[async_trait]
impl SessionStore for RestStore {
    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn fetch_session(&self, user_id: Uuid) -> Result<Option<Session>> {
        let response = self
            .privileged(self.http.get(self.rest_url("sessions")))
            .query(&[
                ("select", "user_id,access_token,refresh_token,expires_at".to_string()),
                ("user_id", format!("eq.{user_id}")),
                ("order", "expires_at.desc".to_string()),
                ("limit", "1".to_string()),
            ])
            .send()
            .await
            .map_err(|e| Self::map_send_error("session fetch", &e))?;

        let mut rows: Vec<Session> = Self::read_rows("session fetch", response).await?;
        Ok(rows.pop())
    }

    #[tracing::instrument(level = "debug", skip(self, refresh_token), err)]
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        let response = self
            .http
            .post(format!("{}/auth/v1/token", self.base_url))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| Self::map_send_error("token refresh", &e))?;

        let status = response.status();
        if status.is_client_error() {
            // The provider explicitly rejected the refresh token.
            return Err(AppError::AuthError);
        }
        if !status.is_success() {
            return Err(AppError::Store(format!("token refresh returned {status}")));
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| AppError::Store(format!("token refresh returned malformed JSON: {e}")))?;

        Ok(Session {
            user_id: body.user.id,
            access_token: body.access_token,
            refresh_token: body.refresh_token,
            expires_at: OffsetDateTime::now_utc() + time::Duration::seconds(body.expires_in),
        })
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
        let response = self
            .privileged(self.http.get(self.rest_url("users")))
            .query(&[
                ("select", "id,role,last_sign_in,authenticated_status".to_string()),
                ("id", format!("eq.{user_id}")),
                ("limit", "1".to_string()),
            ])
            .send()
            .await
            .map_err(|e| Self::map_send_error("profile fetch", &e))?;

        let mut rows: Vec<UserProfile> = Self::read_rows("profile fetch", response).await?;
        Ok(rows.pop())
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn delete_expired_sessions(&self, cutoff: OffsetDateTime) -> Result<u64> {
        let cutoff_str = cutoff.format(&Rfc3339).map_err(|_| AppError::Internal)?;

        // `return=representation` hands the deleted rows back, which is how
        // the sweep obtains its count without a second query.
        let response = self
            .privileged(self.http.delete(self.rest_url("sessions")))
            .query(&[("expires_at", format!("lt.{cutoff_str}")), ("select", "user_id".to_string())])
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(|e| Self::map_send_error("session sweep", &e))?;

        let rows: Vec<serde_json::Value> = Self::read_rows("session sweep", response).await?;
        Ok(rows.len() as u64)
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn list_connections(&self, user_id: Uuid) -> Result<Vec<SocialConnection>> {
        let response = self
            .privileged(self.http.get(self.rest_url("social_connections")))
            .query(&[
                ("select", "id,user_id,fb_page_id,ig_account_id,created_at".to_string()),
                ("user_id", format!("eq.{user_id}")),
                ("order", "created_at.desc".to_string()),
            ])
            .send()
            .await
            .map_err(|e| Self::map_send_error("connection list", &e))?;

        Self::read_rows("connection list", response).await
    }

    #[tracing::instrument(level = "debug", skip(self, connection), err)]
    async fn insert_connection(&self, connection: NewConnection) -> Result<SocialConnection> {
        let response = self
            .privileged(self.http.post(self.rest_url("social_connections")))
            .header("Prefer", "return=representation")
            .json(&connection)
            .send()
            .await
            .map_err(|e| Self::map_send_error("connection insert", &e))?;

        let mut rows: Vec<SocialConnection> = Self::read_rows("connection insert", response).await?;
        rows.pop().ok_or_else(|| AppError::Store("connection insert returned no row".to_string()))
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn delete_connection(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let response = self
            .privileged(self.http.delete(self.rest_url("social_connections")))
            .query(&[("id", format!("eq.{id}")), ("user_id", format!("eq.{user_id}"))])
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(|e| Self::map_send_error("connection delete", &e))?;

        let rows: Vec<serde_json::Value> = Self::read_rows("connection delete", response).await?;
        Ok(!rows.is_empty())
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn ping(&self) -> Result<()> {
        self.http
            .get(format!("{}/auth/v1/health", self.base_url))
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(|e| Self::map_send_error("store ping", &e))?
            .error_for_status()
            .map_err(|e| AppError::Store(format!("store ping rejected: {e}")))?;
        Ok(())
    }
}
