use crate::config::CleanupConfig;
use crate::services::CleanupService;
use std::time::Duration;
use tracing::Instrument;

/// In-process counterpart of the maintenance endpoint: runs the expired
/// session sweep on an interval. The external scheduler remains the primary
/// trigger; this worker covers deployments without one.
#[derive(Debug)]
pub struct SessionCleanupWorker {
    cleanup: CleanupService,
    config: CleanupConfig,
}

impl SessionCleanupWorker {
    #[must_use]
    pub const fn new(cleanup: CleanupService, config: CleanupConfig) -> Self {
        Self { cleanup, config }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        if self.config.interval_secs == 0 {
            tracing::info!("Session cleanup worker is disabled (interval = 0)");
            return;
        }

        let mut interval = tokio::time::interval(Duration::from_secs(self.config.interval_secs));

        while !*shutdown.borrow() {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.cleanup
                        .sweep_expired()
                        .instrument(tracing::info_span!("run_session_cleanup"))
                        .await
                    {
                        tracing::error!(error = ?e, "Session cleanup iteration failed");
                    }
                }
                _ = shutdown.changed() => {}
            }
        }
        tracing::info!("Session cleanup loop shutting down...");
    }
}
