//! Decoded responses and service error classification

use crate::error::{QianfanError, QianfanResult};
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Header carrying the server-side request id
pub const REQUEST_ID_HEADER: &str = "x-bce-request-id";
/// Header carrying the request quota the server applies to the caller
pub const RATELIMIT_LIMIT_REQUESTS_HEADER: &str = "x-ratelimit-limit-requests";

/// A decoded JSON response with its status and headers
#[derive(Debug, Clone)]
pub struct QfResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Value,
}

impl QfResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn request_id(&self) -> Option<&str> {
        self.header(REQUEST_ID_HEADER)
            .or_else(|| self.body.get("id").and_then(Value::as_str))
    }

    /// Request limit reported by the server, if any
    pub fn ratelimit_limit_requests(&self) -> Option<u32> {
        self.header(RATELIMIT_LIMIT_REQUESTS_HEADER)
            .and_then(|v| v.trim().parse().ok())
    }

    /// Deserialize the body into a typed response
    pub fn json<T: DeserializeOwned>(&self) -> QianfanResult<T> {
        Ok(serde_json::from_value(self.body.clone())?)
    }
}

/// Application error code inside a body, zero counts as success
pub fn body_error_code(body: &Value) -> Option<i64> {
    body.get("error_code")
        .and_then(Value::as_i64)
        .filter(|code| *code != 0)
}

fn body_error_message(body: &Value) -> Option<String> {
    ["error_msg", "error_description", "message"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Upper bound on a server-provided retry hint
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Retry hint from `retry-after-ms` or `retry-after` (seconds)
///
/// Values beyond [`MAX_RETRY_AFTER`] are clamped to it.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| !v.is_nan() && *v >= 0.0)
    };
    let secs = read("retry-after-ms")
        .map(|ms| ms / 1000.0)
        .or_else(|| read("retry-after"))?;
    Some(Duration::from_secs_f64(secs.min(MAX_RETRY_AFTER.as_secs_f64())))
}

/// Turn a decoded answer into an error when the service reported one
///
/// Non-2xx statuses always fail; a 2xx body fails when it carries a
/// non-zero `error_code`.
pub fn check_response(status: u16, headers: &HeaderMap, body: &Value) -> QianfanResult<()> {
    let code = body_error_code(body);
    let success = (200..300).contains(&status);
    if success && code.is_none() {
        return Ok(());
    }

    let message = body_error_message(body).unwrap_or_else(|| match body {
        Value::Null => format!("HTTP {}", status),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    });

    let mut error = QianfanError::api(status, code, message);
    if let Some(id) = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| body.get("id").and_then(Value::as_str))
    {
        error = error.with_request_id(id);
    }
    if let Some(delay) = retry_after(headers) {
        error = error.with_retry_after(delay);
    }
    Err(error)
}

/// Decode a raw body, falling back to a JSON string for non-JSON error text
pub(crate) fn decode_body(status: u16, bytes: &[u8]) -> QianfanResult<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Ok(value),
        Err(_) if !(200..300).contains(&status) => {
            Ok(Value::String(String::from_utf8_lossy(bytes).into_owned()))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::json;

    #[test]
    fn test_success_body_passes() {
        let body = json!({"result": "hi", "error_code": 0});
        assert!(check_response(200, &HeaderMap::new(), &body).is_ok());
    }

    #[test]
    fn test_error_code_in_200_body() {
        let body = json!({"error_code": 336100, "error_msg": "server high load"});
        let error = check_response(200, &HeaderMap::new(), &body).unwrap_err();

        assert_eq!(error.error_code(), Some(336100));
        assert_eq!(error.status_code(), Some(200));
        assert!(error.to_string().contains("server high load"));
    }

    #[test]
    fn test_non_2xx_captures_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("3"));
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-1"));

        let error = check_response(429, &headers, &Value::Null).unwrap_err();
        match &error {
            QianfanError::Api {
                status,
                retry_after,
                request_id,
                ..
            } => {
                assert_eq!(*status, 429);
                assert_eq!(*retry_after, Some(Duration::from_secs(3)));
                assert_eq!(request_id.as_deref(), Some("req-1"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_huge_retry_after_is_clamped() {
        for name in ["retry-after", "retry-after-ms"] {
            let mut headers = HeaderMap::new();
            headers.insert(name, HeaderValue::from_static("1e30"));
            assert_eq!(retry_after(&headers), Some(MAX_RETRY_AFTER), "{name}");

            let error = check_response(429, &headers, &Value::Null).unwrap_err();
            assert_eq!(error.retry_after(), Some(MAX_RETRY_AFTER));
        }

        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("inf"));
        assert_eq!(retry_after(&headers), Some(MAX_RETRY_AFTER));
    }

    #[test]
    fn test_retry_after_ms_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("3"));
        headers.insert("retry-after-ms", HeaderValue::from_static("250"));

        assert_eq!(retry_after(&headers), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(200, b"").unwrap(), Value::Null);
        assert_eq!(
            decode_body(502, b"Bad Gateway").unwrap(),
            Value::String("Bad Gateway".into())
        );
        assert!(decode_body(200, b"<html>").is_err());
    }
}
