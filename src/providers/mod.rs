use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod facebook;

pub use facebook::FacebookGraph;

/// Server-held application credentials for the social platform. Kept optional
/// in configuration; their absence is a per-invocation configuration error,
/// not a boot failure.
#[derive(Debug, Clone)]
pub struct AppCredentials {
    pub app_id: String,
    pub app_secret: String,
}

impl AppCredentials {
    /// `None` when either credential is missing from the environment.
    #[must_use]
    pub fn from_config(config: &crate::config::SocialConfig) -> Option<Self> {
        match (&config.app_id, &config.app_secret) {
            (Some(app_id), Some(app_secret)) => {
                Some(Self { app_id: app_id.clone(), app_secret: app_secret.clone() })
            }
            _ => None,
        }
    }
}

/// Bearer token obtained from the provider's token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_in: Option<u64>,
}

/// A page/business account the granted token has access to. Field names
/// follow the provider's wire format and pass through to the dashboard
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<String>>,
}

/// Basic identity of the token holder, fetched only for diagnostics.
#[derive(Debug, Clone, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A permission scope the user granted (or declined) on the consent screen.
#[derive(Debug, Clone, Deserialize)]
pub struct GrantedPermission {
    pub permission: String,
    pub status: String,
}

/// Outbound calls against the third-party social graph API. The exchange
/// service only sees this trait; tests substitute a fake.
#[async_trait]
pub trait SocialGraph: Send + Sync + std::fmt::Debug {
    /// Exchanges an authorization code for an access token. Bounded by the
    /// adapter's request timeout and never retried automatically.
    async fn exchange_code(&self, credentials: &AppCredentials, code: &str) -> Result<TokenGrant>;

    /// Lists the pages the token grants access to.
    async fn list_pages(&self, access_token: &str) -> Result<Vec<Page>>;

    /// Fetches the token holder's basic identity.
    async fn fetch_identity(&self, access_token: &str) -> Result<Identity>;

    /// Fetches the permission scopes the user granted.
    async fn fetch_permissions(&self, access_token: &str) -> Result<Vec<GrantedPermission>>;
}
