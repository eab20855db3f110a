//! Retry policy for outbound requests
//!
//! The policy is the single place that decides whether a failed attempt is
//! retried or surfaced to the caller.

use super::backoff::{BackoffStrategy, ExponentialBackoff};
use super::{classify_error, extract_retry_after};
use crate::error::{QianfanError, QianfanResult, codes};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// Configuration for retry behavior
///
/// # Example
/// ```
/// use qianfan_core::recovery::RetryConfig;
/// use std::time::Duration;
///
/// let config = RetryConfig::default()
///     .with_max_attempts(5)
///     .with_backoff_factor(0.5)
///     .with_max_wait_interval(Duration::from_secs(10));
/// assert_eq!(config.max_attempts, 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Upper bound of a single backoff sleep
    #[serde(with = "humantime_serde")]
    pub max_wait_interval: Duration,
    /// Backoff multiplier in seconds (`factor * 2^n`)
    pub backoff_factor: f64,
    /// Total time budget across all attempts
    #[serde(with = "humantime_serde")]
    pub retry_timeout: Duration,
    /// Application error codes that are retried
    #[serde(default = "default_retryable_codes")]
    pub retryable_codes: HashSet<i64>,
    /// HTTP statuses that are retried
    #[serde(default = "default_retryable_statuses")]
    pub retryable_http_statuses: HashSet<u16>,
    /// Randomize backoff to avoid synchronized retries
    #[serde(default = "default_jitter")]
    pub jitter: bool,
}

fn default_retryable_codes() -> HashSet<i64> {
    codes::DEFAULT_RETRYABLE.iter().copied().collect()
}

fn default_retryable_statuses() -> HashSet<u16> {
    [408, 409, 429].into_iter().chain(500..600).collect()
}

fn default_jitter() -> bool {
    true
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            max_wait_interval: Duration::from_secs(120),
            backoff_factor: 1.0,
            retry_timeout: Duration::from_secs(300),
            retryable_codes: default_retryable_codes(),
            retryable_http_statuses: default_retryable_statuses(),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new RetryConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config that never retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Set max attempts
    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    /// Set maximum delay between retries
    pub fn with_max_wait_interval(mut self, interval: Duration) -> Self {
        self.max_wait_interval = interval;
        self
    }

    /// Set backoff factor in seconds
    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Set total retry budget
    pub fn with_retry_timeout(mut self, timeout: Duration) -> Self {
        self.retry_timeout = timeout;
        self
    }

    /// Replace the retryable application codes
    pub fn with_retryable_codes(mut self, codes: impl IntoIterator<Item = i64>) -> Self {
        self.retryable_codes = codes.into_iter().collect();
        self
    }

    /// Replace the retryable HTTP statuses
    pub fn with_retryable_http_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.retryable_http_statuses = statuses.into_iter().collect();
        self
    }

    /// Enable or disable jitter
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> QianfanResult<()> {
        if self.max_attempts == 0 {
            return Err(QianfanError::validation_field(
                "max_attempts must be at least 1",
                "max_attempts",
            ));
        }
        if Duration::try_from_secs_f64(self.backoff_factor).is_err() {
            return Err(QianfanError::validation_field(
                format!("backoff_factor must be a non-negative number of seconds, got {}", self.backoff_factor),
                "backoff_factor",
            ));
        }
        Ok(())
    }

    /// Create an ExponentialBackoff from this config
    pub fn create_backoff(&self) -> ExponentialBackoff {
        let factor = Duration::try_from_secs_f64(self.backoff_factor.max(0.0))
            .unwrap_or(self.max_wait_interval);
        ExponentialBackoff::new(factor, self.max_wait_interval).with_jitter(self.jitter)
    }
}

/// Retry policy for operations
pub struct RetryPolicy {
    config: RetryConfig,
    backoff: Box<dyn BackoffStrategy>,
}

impl RetryPolicy {
    /// Create a new retry policy with custom config
    pub fn with_config(config: RetryConfig) -> Self {
        let backoff = config.create_backoff();
        Self {
            config,
            backoff: Box::new(backoff),
        }
    }

    /// Set custom backoff strategy
    pub fn with_backoff<B: BackoffStrategy + 'static>(mut self, backoff: B) -> Self {
        self.backoff = Box::new(backoff);
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Check if an error should be retried after `attempts` calls
    pub fn should_retry(&self, error: &QianfanError, attempts: u32) -> bool {
        attempts < self.config.max_attempts && classify_error(error, &self.config).is_retryable()
    }

    /// Delay before the retry following the given 0-based failed attempt
    ///
    /// A server-provided `Retry-After` replaces the computed backoff, clamped
    /// to `max_wait_interval`.
    pub fn delay_for(&self, error: &QianfanError, attempt: u32) -> Duration {
        match extract_retry_after(error) {
            Some(hint) => hint.min(self.config.max_wait_interval),
            None => self.backoff.delay_for_attempt(attempt),
        }
    }

    /// Execute an operation with retries
    ///
    /// Non-retryable failures are returned as-is after a single call.
    /// Running out of attempts (or of `retry_timeout`) returns
    /// [`QianfanError::RetriesExhausted`] wrapping the last failure.
    #[instrument(skip_all, fields(max_attempts = self.config.max_attempts))]
    pub async fn execute<T, F, Fut>(
        &self,
        mut operation: F,
        cancel_token: Option<CancellationToken>,
    ) -> QianfanResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = QianfanResult<T>>,
    {
        let start = Instant::now();
        let mut attempts = 0u32;

        loop {
            if cancel_token.as_ref().is_some_and(|t| t.is_cancelled()) {
                return Err(QianfanError::Cancelled);
            }

            let error = match operation().await {
                Ok(value) => {
                    if attempts > 0 {
                        debug!(attempt = attempts + 1, "request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };
            attempts += 1;

            if !classify_error(&error, &self.config).is_retryable() {
                warn!(error = %error, "non-retryable error");
                return Err(error);
            }

            if attempts >= self.config.max_attempts {
                warn!(attempts, error = %error, "all retry attempts exhausted");
                return Err(QianfanError::RetriesExhausted {
                    attempts,
                    last: Box::new(error),
                });
            }

            let delay = self.delay_for(&error, attempts - 1);
            if start.elapsed() + delay > self.config.retry_timeout {
                warn!(
                    attempts,
                    elapsed_secs = start.elapsed().as_secs_f64(),
                    "retry budget exhausted"
                );
                return Err(QianfanError::RetriesExhausted {
                    attempts,
                    last: Box::new(error),
                });
            }

            warn!(
                attempt = attempts,
                max_attempts = self.config.max_attempts,
                delay_secs = delay.as_secs_f64(),
                error = %error,
                "retrying after failure"
            );

            match &cancel_token {
                Some(token) => {
                    tokio::select! {
                        _ = token.cancelled() => return Err(QianfanError::Cancelled),
                        _ = sleep(delay) => {}
                    }
                }
                None => sleep(delay).await,
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::with_config(RetryConfig::default())
    }
}

/// Retry an async operation with the given config
pub async fn retry_with_config<T, F, Fut>(
    config: RetryConfig,
    operation: F,
    cancel_token: Option<CancellationToken>,
) -> QianfanResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = QianfanResult<T>>,
{
    RetryPolicy::with_config(config)
        .execute(operation, cancel_token)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recovery::backoff::ConstantBackoff;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig::default()
            .with_max_attempts(max_attempts)
            .with_backoff_factor(0.0)
    }

    #[tokio::test]
    async fn test_retry_success_immediately() {
        let result: QianfanResult<i32> =
            retry_with_config(fast_config(3), || async { Ok(42) }, None).await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_success_after_failures() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let result = retry_with_config(
            fast_config(3),
            || {
                let attempts = attempts_clone.clone();
                async move {
                    let count = attempts.fetch_add(1, Ordering::SeqCst);
                    if count < 2 {
                        Err(QianfanError::api(200, Some(codes::QPS_LIMIT_REACHED), "qps"))
                    } else {
                        Ok(42)
                    }
                }
            },
            None,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_max_attempts_exceeded() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let result: QianfanResult<i32> = retry_with_config(
            fast_config(3),
            || {
                let attempts = attempts_clone.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(QianfanError::api(503, None, "unavailable"))
                }
            },
            None,
        )
        .await;

        match result.unwrap_err() {
            QianfanError::RetriesExhausted { attempts: n, last } => {
                assert_eq!(n, 3);
                assert_eq!(last.status_code(), Some(503));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_code_called_once() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let result: QianfanResult<i32> = retry_with_config(
            fast_config(5),
            || {
                let attempts = attempts_clone.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(QianfanError::api(200, Some(336003), "invalid parameter"))
                }
            },
            None,
        )
        .await;

        let error = result.unwrap_err();
        assert!(matches!(error, QianfanError::Api { code: Some(336003), .. }));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_cancellation() {
        let token = CancellationToken::new();
        token.cancel();

        let result: QianfanResult<i32> = retry_with_config(
            fast_config(5),
            || async { Err(QianfanError::transport("reset")) },
            Some(token),
        )
        .await;

        assert!(matches!(result, Err(QianfanError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_backoff() {
        let token = CancellationToken::new();
        let policy = RetryPolicy::with_config(fast_config(5))
            .with_backoff(ConstantBackoff::new(Duration::from_secs(30)));

        let canceller = token.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        let result: QianfanResult<i32> = policy
            .execute(|| async { Err(QianfanError::transport("reset")) }, Some(token))
            .await;

        assert!(matches!(result, Err(QianfanError::Cancelled)));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_retry_after_overrides_backoff() {
        let policy = RetryPolicy::with_config(
            RetryConfig::default().with_max_wait_interval(Duration::from_secs(2)),
        );

        let error = QianfanError::api(429, None, "slow down")
            .with_retry_after(Duration::from_millis(700));
        assert_eq!(policy.delay_for(&error, 5), Duration::from_millis(700));

        let error = QianfanError::api(429, None, "slow down")
            .with_retry_after(Duration::from_secs(3600));
        assert_eq!(policy.delay_for(&error, 0), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_retry_timeout_budget() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();
        let policy = RetryPolicy::with_config(
            fast_config(10).with_retry_timeout(Duration::from_millis(100)),
        )
        .with_backoff(ConstantBackoff::new(Duration::from_millis(60)));

        let result: QianfanResult<i32> = policy
            .execute(
                || {
                    let attempts = attempts_clone.clone();
                    async move {
                        attempts.fetch_add(1, Ordering::SeqCst);
                        Err(QianfanError::transport("reset"))
                    }
                },
                None,
            )
            .await;

        assert!(matches!(result, Err(QianfanError::RetriesExhausted { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_should_retry_logic() {
        let policy = RetryPolicy::default();

        assert!(policy.should_retry(&QianfanError::timeout("http://x"), 1));
        assert!(!policy.should_retry(&QianfanError::timeout("http://x"), 3));
        assert!(!policy.should_retry(&QianfanError::api(401, None, "unauthorized"), 1));
    }

    #[test]
    fn test_validate() {
        assert!(RetryConfig::default().validate().is_ok());
        assert!(RetryConfig::default().with_max_attempts(0).validate().is_err());
        assert!(RetryConfig::default().with_backoff_factor(-1.0).validate().is_err());
        assert!(RetryConfig::default().with_backoff_factor(f64::NAN).validate().is_err());

        let huge = RetryConfig::default().with_backoff_factor(1e20);
        assert!(huge.validate().is_err());
        let backoff = huge.create_backoff().with_jitter(false);
        assert_eq!(backoff.delay_for_attempt(0), huge.max_wait_interval);
    }
}
