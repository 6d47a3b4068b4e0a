use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A bearer-credential pair with an absolute expiry, representing an
/// authenticated dashboard user's active login. The store owns the row;
/// this is the client-side cached copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl Session {
    /// A cached copy must never be trusted past `expires_at` without a
    /// refresh attempt.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at < OffsetDateTime::now_utc()
    }

    #[must_use]
    pub fn expires_within(&self, window: time::Duration) -> bool {
        self.expires_at < OffsetDateTime::now_utc() + window
    }
}
