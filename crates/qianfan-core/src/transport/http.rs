//! HTTP transport over reqwest

use super::request::PreparedRequest;
use super::response::{QfResponse, check_response, decode_body};
use super::stream::{EventStream, StreamEvent};
use crate::error::{QianfanError, QianfanResult};
use std::time::Duration;
use tracing::{debug, instrument};

/// Executes prepared requests, one attempt per call
///
/// Retrying is left to the caller. Cloning is cheap and shares the
/// connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    request_timeout: Duration,
}

impl HttpTransport {
    /// Create a transport with its own connection pool
    pub fn new(request_timeout: Duration) -> QianfanResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("qianfan-rust/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| QianfanError::transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, request_timeout))
    }

    pub fn with_client(client: reqwest::Client, request_timeout: Duration) -> Self {
        Self {
            client,
            request_timeout,
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Send a request and decode its JSON answer
    ///
    /// Service errors (non-2xx, or `error_code` in a 2xx body) come back as
    /// [`QianfanError::Api`].
    #[instrument(skip_all, fields(method = %request.method, url = %request.url))]
    pub async fn send(&self, request: &PreparedRequest) -> QianfanResult<QfResponse> {
        let response = request
            .to_reqwest(&self.client)?
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;
        let body = decode_body(status, &bytes)?;
        debug!(status, bytes = bytes.len(), "response received");

        check_response(status, &headers, &body)?;
        Ok(QfResponse {
            status,
            headers,
            body,
        })
    }

    /// Send a streaming request
    ///
    /// The timeout covers connecting and receiving headers only. A plain
    /// JSON answer is turned into an error or a single-event stream.
    #[instrument(skip_all, fields(method = %request.method, url = %request.url))]
    pub async fn send_stream(&self, request: &PreparedRequest) -> QianfanResult<EventStream> {
        let pending = request.to_reqwest(&self.client)?.send();
        let response = tokio::time::timeout(self.request_timeout, pending)
            .await
            .map_err(|_| QianfanError::timeout(request.url.clone()))??;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let is_event_stream = headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/event-stream"));

        if !is_event_stream || !(200..300).contains(&status) {
            let bytes = response.bytes().await?;
            let body = decode_body(status, &bytes)?;
            check_response(status, &headers, &body)?;
            debug!(status, "streaming request answered without event stream");
            return Ok(EventStream::single(
                StreamEvent::complete(body),
                request.url.clone(),
            ));
        }

        debug!(status, "event stream opened");
        Ok(EventStream::new(response.bytes_stream(), request.url.clone()))
    }
}
