use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Claims carried by a store-issued access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// Account creation time, when the store includes it in the token.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

/// Profile row from the store's users table, read as a best-effort
/// enrichment on top of the session claims.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_sign_in: Option<OffsetDateTime>,
    #[serde(default)]
    pub authenticated_status: Option<String>,
}

/// The authenticated dashboard user as exposed to callers. Always
/// constructible from claims alone; profile fields stay `None` when the
/// enrichment read was unavailable.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: Option<String>,
    pub created_at: Option<OffsetDateTime>,
    pub last_sign_in: Option<OffsetDateTime>,
    pub authenticated_status: Option<String>,
}

impl CurrentUser {
    /// Minimal record derived purely from the session claims.
    #[must_use]
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email.clone(),
            role: claims.role.clone(),
            created_at: claims.created_at,
            last_sign_in: None,
            authenticated_status: None,
        }
    }

    /// Merges the profile row over the claims-derived record. Claims win for
    /// identity fields; the profile contributes what only the store knows.
    #[must_use]
    pub fn with_profile(mut self, profile: &UserProfile) -> Self {
        if self.role.is_none() {
            self.role.clone_from(&profile.role);
        }
        self.last_sign_in = profile.last_sign_in;
        self.authenticated_status.clone_from(&profile.authenticated_status);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> Claims {
        Claims {
            sub: Uuid::new_v4(),
            exp: 2_000_000_000,
            email: Some("user@example.com".to_string()),
            role: Some("authenticated".to_string()),
            created_at: None,
        }
    }

    #[test]
    fn test_minimal_record_from_claims() {
        let c = claims();
        let user = CurrentUser::from_claims(&c);
        assert_eq!(user.id, c.sub);
        assert_eq!(user.email.as_deref(), Some("user@example.com"));
        assert!(user.last_sign_in.is_none());
    }

    #[test]
    fn test_profile_enrichment_preserves_claims() {
        let c = claims();
        let profile = UserProfile {
            id: c.sub,
            role: Some("admin".to_string()),
            last_sign_in: Some(OffsetDateTime::now_utc()),
            authenticated_status: Some("active".to_string()),
        };
        let user = CurrentUser::from_claims(&c).with_profile(&profile);
        // Claims role wins; profile fills in the rest.
        assert_eq!(user.role.as_deref(), Some("authenticated"));
        assert!(user.last_sign_in.is_some());
        assert_eq!(user.authenticated_status.as_deref(), Some("active"));
    }
}
