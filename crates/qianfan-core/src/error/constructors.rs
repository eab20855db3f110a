//! Constructor and accessor methods for QianfanError

use super::codes;
use super::types::QianfanError;
use crate::recovery::{RetryConfig, classify_error, extract_retry_after};
use std::time::Duration;

impl QianfanError {
    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a validation error naming the offending field
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create an unsupported-model error
    pub fn unsupported_model(capability: impl Into<String>, model: impl Into<String>) -> Self {
        Self::UnsupportedModel {
            capability: capability.into(),
            model: model.into(),
        }
    }

    /// Create a non-retryable authentication error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
            code: None,
            retryable: false,
        }
    }

    /// Create an authentication error caused by a transient condition
    pub fn auth_transient(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
            code: None,
            retryable: true,
        }
    }

    /// Create a new transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            url: None,
            timeout: false,
        }
    }

    /// Create a transport error for a timed out attempt
    pub fn timeout(url: impl Into<String>) -> Self {
        let url = url.into();
        Self::Transport {
            message: format!("request to {} timed out", url),
            url: Some(url),
            timeout: true,
        }
    }

    /// Create an API error from a status and an optional application code
    pub fn api(status: u16, code: Option<i64>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            code,
            message: message.into(),
            request_id: None,
            retry_after: None,
        }
    }

    /// Create a new stream error
    pub fn stream(message: impl Into<String>) -> Self {
        Self::Stream {
            message: message.into(),
        }
    }

    /// Create a new JSON error
    pub fn json(message: impl Into<String>) -> Self {
        Self::Json {
            message: message.into(),
        }
    }

    /// Application error code carried by this error, if any
    pub fn error_code(&self) -> Option<i64> {
        match self {
            Self::Api { code, .. } | Self::Auth { code, .. } => *code,
            Self::RetriesExhausted { last, .. } => last.error_code(),
            _ => None,
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::RetriesExhausted { last, .. } => last.status_code(),
            _ => None,
        }
    }

    /// Whether the service rejected the access token as invalid or expired
    pub fn is_token_expired(&self) -> bool {
        self.error_code()
            .is_some_and(|code| codes::TOKEN_EXPIRED.contains(&code))
    }

    /// Whether the error stems from configuration rather than a network call
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::UnsupportedModel { .. })
    }

    /// Whether the retry policy built from `config` would retry this error
    pub fn is_retryable(&self, config: &RetryConfig) -> bool {
        classify_error(self, config).is_retryable()
    }

    /// Server-provided delay before the next attempt
    pub fn retry_after(&self) -> Option<Duration> {
        extract_retry_after(self)
    }

    /// Attach the request id reported by the server
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        if let Self::Api { request_id, .. } = &mut self {
            *request_id = Some(id.into());
        }
        self
    }

    /// Attach a server-provided retry delay
    pub fn with_retry_after(mut self, delay: Duration) -> Self {
        if let Self::Api { retry_after, .. } = &mut self {
            *retry_after = Some(delay);
        }
        self
    }
}
