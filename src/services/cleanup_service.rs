use crate::error::Result;
use crate::storage::SessionStore;
use opentelemetry::{global, metrics::Counter};
use std::sync::Arc;
use time::OffsetDateTime;

#[derive(Clone, Debug)]
struct Metrics {
    sessions_swept_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("pagedash-server");
        Self {
            sessions_swept_total: meter
                .u64_counter("sessions_swept_total")
                .with_description("Total number of expired session rows deleted")
                .build(),
        }
    }
}

/// Expired-session sweep shared by the maintenance endpoint and the
/// in-process worker.
#[derive(Clone, Debug)]
pub struct CleanupService {
    store: Arc<dyn SessionStore>,
    metrics: Metrics,
}

impl CleanupService {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store, metrics: Metrics::new() }
    }

    /// Deletes every session row that expired before the moment this sweep
    /// started. One cutoff, one bulk delete; the invoking scheduler owns
    /// re-invocation on failure.
    ///
    /// # Errors
    /// Returns the store error when the delete fails.
    #[tracing::instrument(skip(self), err, fields(expired_deleted = tracing::field::Empty))]
    pub async fn sweep_expired(&self) -> Result<u64> {
        let cutoff = OffsetDateTime::now_utc();
        let deleted = self.store.delete_expired_sessions(cutoff).await?;

        tracing::Span::current().record("expired_deleted", deleted);
        if deleted > 0 {
            tracing::info!(count = %deleted, "Deleted expired sessions");
        }
        self.metrics.sessions_swept_total.add(deleted, &[]);

        Ok(deleted)
    }
}
