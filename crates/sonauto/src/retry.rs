//! Bounded exponential-backoff retry for idempotent Sonauto calls.
//!
//! Status polls and media downloads are safe to repeat, so a transient
//! failure (network error, 429, 5xx) is retried a fixed number of times
//! before the lifecycle gives up. Submissions are never retried.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::api::SonautoApiError;

/// Tunable parameters for the retry strategy.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
    /// Retries after the first attempt. Zero means fail fast.
    pub max_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            max_retries: 3,
        }
    }
}

/// Why a retried operation did not produce a value.
#[derive(Debug, thiserror::Error)]
pub enum RetryError {
    /// The cancellation token fired while waiting or calling.
    #[error("cancelled")]
    Cancelled,

    /// The remote side gave a definitive, non-retryable answer.
    #[error(transparent)]
    Rejected(SonautoApiError),

    /// Every attempt failed with a transient error.
    #[error("gave up after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        source: SonautoApiError,
    },
}

/// Calculate the next backoff delay, clamped to [`RetryConfig::max_delay`].
pub fn next_delay(current: Duration, config: &RetryConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// Run `op` until it succeeds, fails definitively, runs out of retries,
/// or `cancel` fires.
pub async fn retry_transient<T, F, Fut>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    operation: &str,
    mut op: F,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SonautoApiError>>,
{
    let mut delay = config.initial_delay;
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        let result = tokio::select! {
            _ = cancel.cancelled() => return Err(RetryError::Cancelled),
            result = op() => result,
        };

        let err = match result {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_transient() => return Err(RetryError::Rejected(err)),
            Err(err) => err,
        };

        if attempt > config.max_retries {
            return Err(RetryError::Exhausted {
                attempts: attempt,
                source: err,
            });
        }

        tracing::warn!(
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Transient Sonauto error, retrying",
        );

        tokio::select! {
            _ = cancel.cancelled() => return Err(RetryError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
        delay = next_delay(delay, config);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use assert_matches::assert_matches;

    use super::*;

    fn fast_config(max_retries: u32) -> RetryConfig {
        RetryConfig {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            multiplier: 2.0,
            max_retries,
        }
    }

    fn server_error() -> SonautoApiError {
        SonautoApiError::Api {
            status: 503,
            body: "busy".into(),
        }
    }

    #[test]
    fn delay_doubles_and_clamps() {
        let config = RetryConfig::default();
        assert_eq!(next_delay(Duration::from_secs(1), &config), Duration::from_secs(2));
        assert_eq!(next_delay(Duration::from_secs(8), &config), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = retry_transient(&fast_config(3), &CancellationToken::new(), "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(server_error())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> =
            retry_transient(&fast_config(2), &CancellationToken::new(), "test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(server_error()) }
            })
            .await;

        assert_matches!(result, Err(RetryError::Exhausted { attempts: 3, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn definitive_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> =
            retry_transient(&fast_config(5), &CancellationToken::new(), "test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(SonautoApiError::Api {
                        status: 401,
                        body: "bad key".into(),
                    })
                }
            })
            .await;

        assert_matches!(result, Err(RetryError::Rejected(SonautoApiError::Api { status: 401, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancellation_stops_retrying() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result: Result<(), _> = retry_transient(&fast_config(5), &cancel, "test", || async {
            std::future::pending::<Result<(), SonautoApiError>>().await
        })
        .await;

        assert_matches!(result, Err(RetryError::Cancelled));
    }
}
