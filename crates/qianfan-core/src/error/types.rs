//! Core error type for the Qianfan request core

use std::time::Duration;
use thiserror::Error;

/// Result type alias for Qianfan operations
pub type QianfanResult<T> = Result<T, QianfanError>;

/// Main error type for the Qianfan request core
///
/// The variants follow the failure taxonomy of the request pipeline:
/// configuration problems are [`QianfanError::Validation`] and are raised
/// before any network call, credential exchange problems are
/// [`QianfanError::Auth`], connection failures are
/// [`QianfanError::Transport`], error codes reported by the service are
/// [`QianfanError::Api`], and SSE failures are [`QianfanError::Stream`].
#[derive(Error, Debug, Clone)]
pub enum QianfanError {
    /// Malformed configuration or request input
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// No endpoint is known for the model under the given capability
    #[error("Unsupported model '{model}' for capability '{capability}'")]
    UnsupportedModel { capability: String, model: String },

    /// Credential exchange or signing failure
    #[error("Authentication error: {message}")]
    Auth {
        message: String,
        code: Option<i64>,
        retryable: bool,
    },

    /// Connection, DNS, TLS or timeout failure
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        url: Option<String>,
        timeout: bool,
    },

    /// Error reported by the service, either as a non-2xx status or as an
    /// error code inside a 200 body
    #[error("API error (status {status}, code {code:?}): {message}")]
    Api {
        status: u16,
        code: Option<i64>,
        message: String,
        request_id: Option<String>,
        retry_after: Option<Duration>,
    },

    /// Malformed SSE frame or premature end of a stream
    #[error("Stream error: {message}")]
    Stream { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json { message: String },

    /// Every attempt allowed by the retry policy failed
    #[error("Retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<QianfanError>,
    },

    /// The operation was cancelled by the caller
    #[error("Request was cancelled")]
    Cancelled,
}
