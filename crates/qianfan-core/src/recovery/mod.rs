//! Error recovery for outbound requests
//!
//! This module provides:
//! - Error classification (transient vs permanent)
//! - Retry policy with exponential backoff and jitter
//! - Per-key token bucket rate limiting

pub mod backoff;
pub mod rate_limiter;
pub mod retry;

pub use backoff::{BackoffStrategy, ExponentialBackoff};
pub use rate_limiter::{RateLimitConfig, RateLimitMode, RateLimiter};
pub use retry::{RetryConfig, RetryPolicy};

use crate::error::QianfanError;
use std::time::Duration;

/// Error classification for recovery decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient errors that may succeed on retry
    Transient,
    /// Permanent errors that will not succeed on retry
    Permanent,
}

impl ErrorClass {
    /// Check if the class allows a retry
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Transient)
    }
}

/// Classify an error against the retry configuration
///
/// HTTP status rules apply first; an application code inside the body is
/// retryable only when it is in the configured allow-list.
pub fn classify_error(error: &QianfanError, config: &RetryConfig) -> ErrorClass {
    match error {
        QianfanError::Transport { .. } => ErrorClass::Transient,
        QianfanError::Auth { retryable, .. } => {
            if *retryable {
                ErrorClass::Transient
            } else {
                ErrorClass::Permanent
            }
        }
        QianfanError::Api { status, code, .. } => {
            if let Some(code) = code {
                if config.retryable_codes.contains(code) {
                    return ErrorClass::Transient;
                }
            }
            if (200..300).contains(status) {
                // Business error inside a successful response
                ErrorClass::Permanent
            } else if config.retryable_http_statuses.contains(status) {
                ErrorClass::Transient
            } else {
                ErrorClass::Permanent
            }
        }
        QianfanError::Validation { .. }
        | QianfanError::UnsupportedModel { .. }
        | QianfanError::Stream { .. }
        | QianfanError::Json { .. }
        | QianfanError::RetriesExhausted { .. }
        | QianfanError::Cancelled => ErrorClass::Permanent,
    }
}

/// Extract a server-provided retry hint from an error
pub fn extract_retry_after(error: &QianfanError) -> Option<Duration> {
    match error {
        QianfanError::Api { retry_after, .. } => *retry_after,
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::codes;

    #[test]
    fn test_http_status_classification() {
        let config = RetryConfig::default();

        for status in [408, 409, 429, 500, 502, 503, 504] {
            let error = QianfanError::api(status, None, "failure");
            assert!(
                classify_error(&error, &config).is_retryable(),
                "status {status} should be retryable"
            );
        }
        for status in [400, 401, 403, 404, 422] {
            let error = QianfanError::api(status, None, "failure");
            assert!(
                !classify_error(&error, &config).is_retryable(),
                "status {status} should not be retryable"
            );
        }
    }

    #[test]
    fn test_application_code_classification() {
        let config = RetryConfig::default();

        let busy = QianfanError::api(200, Some(codes::SERVER_HIGH_LOAD), "busy");
        assert_eq!(classify_error(&busy, &config), ErrorClass::Transient);

        let bad_param = QianfanError::api(200, Some(336003), "invalid parameter");
        assert_eq!(classify_error(&bad_param, &config), ErrorClass::Permanent);

        let custom = RetryConfig::default().with_retryable_codes([336003]);
        assert_eq!(classify_error(&bad_param, &custom), ErrorClass::Transient);
        assert_eq!(classify_error(&busy, &custom), ErrorClass::Permanent);
    }

    #[test]
    fn test_transport_and_config_classification() {
        let config = RetryConfig::default();
        assert!(classify_error(&QianfanError::timeout("http://x"), &config).is_retryable());
        assert!(classify_error(&QianfanError::transport("reset"), &config).is_retryable());
        assert!(!classify_error(&QianfanError::validation("bad"), &config).is_retryable());
        assert!(!classify_error(&QianfanError::auth("denied"), &config).is_retryable());
        assert!(classify_error(&QianfanError::auth_transient("iam 503"), &config).is_retryable());
    }
}
