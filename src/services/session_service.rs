use crate::domain::outcome::Outcome;
use crate::domain::session::Session;
use crate::domain::user::{Claims, CurrentUser};
use crate::error::{AppError, Result};
use crate::retry::{RetryPolicy, retry_with_backoff};
use crate::storage::SessionStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(3);

/// Per-invocation session lifecycle client.
///
/// One instance is built per authenticated request and owns its own cached
/// copy of the session; instances never coordinate, the store provides its
/// own concurrency control. Degraded-but-functional states come back as
/// values (`None`, `false`, claims-only records); only an exhausted retry
/// budget propagates as an error.
#[derive(Debug)]
pub struct SessionClient {
    store: Arc<dyn SessionStore>,
    claims: Claims,
    cached: RwLock<Option<Session>>,
    offline: AtomicBool,
    attempt_timeout: Duration,
}

impl SessionClient {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, claims: Claims) -> Self {
        Self {
            store,
            claims,
            cached: RwLock::new(None),
            offline: AtomicBool::new(false),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    #[must_use]
    pub const fn user_id(&self) -> uuid::Uuid {
        self.claims.sub
    }

    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::Relaxed)
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    /// The cached session, if any. A pure local read; never touches the
    /// store.
    pub async fn get_session(&self) -> Option<Session> {
        self.cached.read().await.clone()
    }

    /// Fetches the session from the store, racing the fetch against a timer
    /// so an unreachable store cannot hang the caller.
    ///
    /// # Errors
    /// `AppError::Timeout` when the store does not answer in time; store
    /// errors pass through.
    pub async fn get_session_with_timeout(&self, timeout: Duration) -> Result<Option<Session>> {
        let fetched = tokio::time::timeout(timeout, self.store.fetch_session(self.claims.sub)).await;

        match fetched {
            Err(_) => {
                self.set_offline(true);
                Err(AppError::Timeout(format!(
                    "session store did not respond within {}ms",
                    timeout.as_millis()
                )))
            }
            Ok(Err(e)) => {
                if e.is_transient() {
                    self.set_offline(true);
                }
                Err(e)
            }
            Ok(Ok(session)) => {
                self.set_offline(false);
                if let Some(s) = &session {
                    *self.cached.write().await = Some(s.clone());
                }
                Ok(session)
            }
        }
    }

    /// Repeats the timed lookup until a session appears or the wall-clock
    /// budget runs out. Absorbs the eventual-consistency window right after
    /// an OAuth redirect, where the session row may not be queryable yet.
    ///
    /// Attempts are strictly sequential with linear backoff
    /// (`min(initial_delay × attempt, 2000ms)`).
    ///
    /// # Errors
    /// The last observed store error, or `AppError::Timeout` when every
    /// attempt came back empty.
    #[tracing::instrument(skip(self), err(level = "warn"), fields(user_id = %self.claims.sub))]
    pub async fn get_session_with_retry(
        &self,
        max_elapsed: Duration,
        initial_delay: Duration,
    ) -> Result<Session> {
        let policy = RetryPolicy::new(max_elapsed, initial_delay);
        let session = retry_with_backoff(
            &policy,
            || self.get_session_with_timeout(self.attempt_timeout),
            |outcome| match outcome {
                Ok(Some(_)) => false,
                Ok(None) => true,
                Err(e) => e.is_transient(),
            },
        )
        .await?;

        session.ok_or_else(|| {
            AppError::Timeout("session was not available within the retry budget".to_string())
        })
    }

    /// Requests a new access/refresh pair from the store. Returns `false`
    /// instead of erroring when the client is offline or the store rejects,
    /// so callers can continue in a logged-out state. The cached session is
    /// only replaced on success.
    #[tracing::instrument(skip(self), fields(user_id = %self.claims.sub))]
    pub async fn refresh_token(&self) -> bool {
        if self.is_offline() {
            tracing::warn!("Skipping token refresh while offline");
            return false;
        }

        // The guard must drop before the store lookup below, which takes the
        // write lock on success.
        let cached_token = self.cached.read().await.as_ref().map(|s| s.refresh_token.clone());
        let refresh_token = match cached_token {
            Some(token) => token,
            None => match self.get_session_with_timeout(self.attempt_timeout).await {
                Ok(Some(session)) => session.refresh_token,
                Ok(None) => {
                    tracing::debug!("No session to refresh");
                    return false;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Session lookup before refresh failed");
                    return false;
                }
            },
        };

        match self.store.refresh_session(&refresh_token).await {
            Ok(session) => {
                *self.cached.write().await = Some(session);
                tracing::debug!("Token refreshed");
                true
            }
            Err(e) => {
                if e.is_transient() {
                    self.set_offline(true);
                }
                tracing::warn!(error = %e, "Token refresh failed");
                false
            }
        }
    }

    /// The authenticated user, enriched from the profile table when the
    /// store cooperates and derived purely from the session claims when it
    /// does not.
    pub async fn current_user(&self) -> Outcome<CurrentUser> {
        let minimal = CurrentUser::from_claims(&self.claims);

        match self.store.fetch_profile(self.claims.sub).await {
            Ok(Some(profile)) => Outcome::Ok(minimal.with_profile(&profile)),
            Ok(None) => Outcome::Degraded {
                value: minimal,
                warning: "profile row not found; returning session claims only".to_string(),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Profile enrichment failed; falling back to claims");
                Outcome::Degraded { value: minimal, warning: e.to_string() }
            }
        }
    }
}
