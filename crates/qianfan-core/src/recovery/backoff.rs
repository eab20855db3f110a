//! Backoff strategies for retry operations

use rand::Rng;
use std::time::Duration;

/// Lower bound of the multiplicative jitter factor
pub const JITTER_MIN: f64 = 0.75;
/// Upper bound of the multiplicative jitter factor
pub const JITTER_MAX: f64 = 1.0;

/// Backoff strategy trait
pub trait BackoffStrategy: Send + Sync {
    /// Get the delay for the given retry number (0-indexed)
    fn delay_for_attempt(&self, attempt: u32) -> Duration;
}

/// Exponential backoff: `min(max_delay, factor * 2^attempt) * jitter`
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    factor: Duration,
    max_delay: Duration,
    jitter: bool,
}

impl ExponentialBackoff {
    /// Create a new exponential backoff
    pub fn new(factor: Duration, max_delay: Duration) -> Self {
        Self {
            factor,
            max_delay,
            jitter: true,
        }
    }

    /// Enable or disable jitter
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before jitter is applied
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exp = 2f64.powi(attempt.min(62) as i32);
        let secs = (self.factor.as_secs_f64() * exp).min(self.max_delay.as_secs_f64());
        Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(self.max_delay)
    }
}

impl BackoffStrategy for ExponentialBackoff {
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay(attempt);
        if !self.jitter || delay.is_zero() {
            return delay;
        }
        let factor = rand::thread_rng().gen_range(JITTER_MIN..=JITTER_MAX);
        Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(delay)
    }
}

/// Constant backoff - same delay for all attempts
#[derive(Debug, Clone)]
pub struct ConstantBackoff {
    delay: Duration,
}

impl ConstantBackoff {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl BackoffStrategy for ConstantBackoff {
    fn delay_for_attempt(&self, _attempt: u32) -> Duration {
        self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff_delays() {
        let backoff = ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(10))
            .with_jitter(false);

        assert_eq!(backoff.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(backoff.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(backoff.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(backoff.delay_for_attempt(3), Duration::from_millis(800));
    }

    #[test]
    fn test_exponential_backoff_cap() {
        let backoff =
            ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(5)).with_jitter(false);

        // 2^10 seconds is capped
        assert_eq!(backoff.delay_for_attempt(10), Duration::from_secs(5));
        assert_eq!(backoff.delay_for_attempt(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let backoff = ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(60));

        for attempt in 0..5 {
            let base = backoff.base_delay(attempt).as_secs_f64();
            for _ in 0..50 {
                let delay = backoff.delay_for_attempt(attempt).as_secs_f64();
                assert!(delay >= base * JITTER_MIN - 1e-9);
                assert!(delay <= base * JITTER_MAX + 1e-9);
            }
        }
    }

    #[test]
    fn test_zero_factor_never_sleeps() {
        let backoff = ExponentialBackoff::new(Duration::ZERO, Duration::from_secs(60));
        assert_eq!(backoff.delay_for_attempt(4), Duration::ZERO);
    }

    #[test]
    fn test_unbounded_delay_does_not_overflow() {
        let backoff = ExponentialBackoff::new(Duration::from_secs(u64::MAX / 2), Duration::MAX);
        for attempt in [0, 10, 62, 100] {
            assert!(!backoff.delay_for_attempt(attempt).is_zero());
        }
    }

    #[test]
    fn test_constant_backoff() {
        let backoff = ConstantBackoff::new(Duration::from_secs(1));

        assert_eq!(backoff.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(backoff.delay_for_attempt(100), Duration::from_secs(1));
    }
}
