//! Tests for error helpers

use super::*;

#[test]
fn test_error_code_through_exhausted_retries() {
    let last = QianfanError::api(200, Some(codes::SERVER_HIGH_LOAD), "server busy");
    let error = QianfanError::RetriesExhausted {
        attempts: 3,
        last: Box::new(last),
    };

    assert_eq!(error.error_code(), Some(codes::SERVER_HIGH_LOAD));
    assert_eq!(error.status_code(), Some(200));
    assert!(error.to_string().contains("3 attempts"));
}

#[test]
fn test_token_expired_detection() {
    assert!(QianfanError::api(200, Some(codes::ACCESS_TOKEN_EXPIRED), "expired").is_token_expired());
    assert!(QianfanError::api(200, Some(codes::ACCESS_TOKEN_INVALID), "invalid").is_token_expired());
    assert!(!QianfanError::api(200, Some(codes::QPS_LIMIT_REACHED), "qps").is_token_expired());
    assert!(!QianfanError::transport("reset").is_token_expired());
}

#[test]
fn test_validation_classification() {
    assert!(QianfanError::validation("both limits set").is_validation());
    assert!(QianfanError::unsupported_model("chat", "nope").is_validation());
    assert!(!QianfanError::auth("bad secret").is_validation());
}

#[test]
fn test_timeout_constructor() {
    let error = QianfanError::timeout("https://aip.baidubce.com/x");
    match error {
        QianfanError::Transport { timeout, url, .. } => {
            assert!(timeout);
            assert_eq!(url.as_deref(), Some("https://aip.baidubce.com/x"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_json_conversion() {
    let err: QianfanError = serde_json::from_str::<serde_json::Value>("{oops")
        .unwrap_err()
        .into();
    assert!(matches!(err, QianfanError::Json { .. }));
}

#[test]
fn test_retry_helpers() {
    use crate::recovery::RetryConfig;
    use std::time::Duration;

    let config = RetryConfig::default();
    let error = QianfanError::api(429, None, "too many requests")
        .with_retry_after(Duration::from_secs(2))
        .with_request_id("req-42");

    assert!(error.is_retryable(&config));
    assert_eq!(error.retry_after(), Some(Duration::from_secs(2)));
    assert!(!QianfanError::Cancelled.is_retryable(&config));
    assert_eq!(QianfanError::transport("reset").retry_after(), None);
}
