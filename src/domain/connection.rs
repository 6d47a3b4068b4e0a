use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A social account the user has explicitly authorized through the OAuth
/// flow. Rows are only ever created by that flow and only ever removed by an
/// explicit user action; a revoked upstream token leaves the row stale until
/// the user deletes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialConnection {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub fb_page_id: Option<String>,
    #[serde(default)]
    pub ig_account_id: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Insert payload for a new connection record.
#[derive(Debug, Clone, Serialize)]
pub struct NewConnection {
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fb_page_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ig_account_id: Option<String>,
}

impl NewConnection {
    /// A connection must reference at least one platform account.
    #[must_use]
    pub const fn has_platform_account(&self) -> bool {
        self.fb_page_id.is_some() || self.ig_account_id.is_some()
    }
}
