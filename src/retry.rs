//! Bounded retry with linear backoff.
//!
//! One wall-clock budget covers the whole loop: attempts run strictly
//! sequentially, the delay grows linearly per attempt up to a cap, and the
//! loop gives up deterministically once the budget cannot fit another wait.

use crate::error::AppError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Hard wall-clock ceiling for the whole loop, excluding the attempt
    /// already in flight when the ceiling is reached.
    pub max_elapsed: Duration,
    /// Base delay; attempt `n` waits `min(initial_delay * n, max_delay)`.
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_elapsed: Duration, initial_delay: Duration) -> Self {
        Self { max_elapsed, initial_delay, max_delay: DEFAULT_MAX_DELAY }
    }

    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.initial_delay.saturating_mul(attempt).min(self.max_delay)
    }
}

/// Runs `op` until `should_retry` declines the outcome or the policy's
/// wall-clock budget is exhausted. Attempts are sequential; there is never
/// more than one in flight.
///
/// On exhaustion, the last observed error is returned; if every retried
/// outcome was a success value the predicate rejected, a generic timeout
/// error is returned instead.
///
/// # Errors
/// Returns the terminal outcome's error, the last observed error on
/// exhaustion, or `AppError::Timeout` when no error was recorded.
pub async fn retry_with_backoff<T, F, Fut, P>(
    policy: &RetryPolicy,
    mut op: F,
    mut should_retry: P,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
    P: FnMut(&Result<T, AppError>) -> bool,
{
    let started = Instant::now();
    let mut attempt: u32 = 0;
    let mut last_error: Option<AppError> = None;

    loop {
        attempt += 1;
        let outcome = op().await;
        if !should_retry(&outcome) {
            return outcome;
        }
        if let Err(e) = outcome {
            tracing::debug!(attempt, error = %e, "Retryable attempt failed");
            last_error = Some(e);
        }

        let delay = policy.delay_for(attempt);
        if started.elapsed() + delay >= policy.max_elapsed {
            return Err(last_error
                .unwrap_or_else(|| AppError::Timeout("retry budget exhausted".to_string())));
        }
        tokio::time::sleep(delay).await;
    }
}
