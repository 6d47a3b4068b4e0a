use crate::domain::connection::{NewConnection, SocialConnection};
use crate::domain::session::Session;
use crate::domain::user::UserProfile;
use crate::error::Result;
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

pub mod rest;

pub use rest::RestStore;

/// All interaction with the hosted backend (sessions, users, connections)
/// goes through this trait. The store provides its own concurrency control;
/// callers share one long-lived handle and never serialize access.
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    /// Latest session row for the user, or `None` when signed out. Right
    /// after an OAuth redirect the row may not be queryable yet; callers that
    /// need it use the bounded retry in the session client.
    async fn fetch_session(&self, user_id: Uuid) -> Result<Option<Session>>;

    /// Exchanges a refresh token for a new access/refresh pair.
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session>;

    /// Profile row for the user, used as best-effort enrichment.
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>>;

    /// Deletes every session row with `expires_at` strictly before `cutoff`
    /// and returns how many rows were removed.
    async fn delete_expired_sessions(&self, cutoff: OffsetDateTime) -> Result<u64>;

    async fn list_connections(&self, user_id: Uuid) -> Result<Vec<SocialConnection>>;

    async fn insert_connection(&self, connection: NewConnection) -> Result<SocialConnection>;

    /// Removes a connection owned by the user. Returns `false` when no such
    /// row existed.
    async fn delete_connection(&self, user_id: Uuid, id: Uuid) -> Result<bool>;

    /// Cheap connectivity probe for the readiness check.
    async fn ping(&self) -> Result<()>;
}
