//! Request pipeline building blocks

use super::QianfanClient;
use qianfan_core::endpoint::Capability;
use qianfan_core::error::{QianfanError, QianfanResult};
use qianfan_core::recovery::{RateLimitMode, RetryConfig, RetryPolicy};
use qianfan_core::transport::{EventStream, Method, PreparedRequest, QfResponse};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

impl QianfanClient {
    /// Build a request and attach credentials
    ///
    /// `url` may carry a query string; `query` entries are appended to it.
    pub async fn sign_and_prepare(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> QianfanResult<PreparedRequest> {
        let mut request = PreparedRequest::new(method, url)?;
        for (key, value) in query {
            request = request.with_query(*key, *value);
        }
        for (name, value) in headers {
            request.set_header(*name, *value);
        }
        if let Some(body) = body {
            request = request.with_json(body);
        }
        self.signer.sign(&mut request).await?;
        Ok(request)
    }

    /// Endpoint path for a model, see [`qianfan_core::EndpointResolver::resolve`]
    pub async fn resolve_endpoint(
        &self,
        capability: Capability,
        model: Option<&str>,
        explicit_endpoint: Option<&str>,
    ) -> QianfanResult<String> {
        self.resolver
            .resolve(capability, model, explicit_endpoint)
            .await
    }

    /// Wait for one unit of rate-limit quota for `key`
    ///
    /// Returns how long the call was held back; `None` when unlimited.
    pub async fn acquire_quota(&self, key: &str) -> Option<Duration> {
        let waited = self.limiter.acquire(key).await;
        if let Some(waited) = waited.filter(|w| !w.is_zero()) {
            debug!(key, waited_ms = waited.as_millis() as u64, "rate limited");
        }
        waited
    }

    /// Run `operation` under the client's retry policy
    ///
    /// `retry` overrides the configured policy for this call. Cancelling the
    /// client's token aborts any pending backoff.
    pub async fn execute_with_retry<T, F, Fut>(
        &self,
        operation: F,
        retry: Option<&RetryConfig>,
    ) -> QianfanResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = QianfanResult<T>>,
    {
        let config = retry.unwrap_or(&self.config.retry).clone();
        RetryPolicy::with_config(config)
            .execute(operation, self.cancel_token.clone())
            .await
    }

    /// Send a signed request once
    pub async fn send(&self, request: &PreparedRequest) -> QianfanResult<QfResponse> {
        match self.transport.send(request).await {
            Ok(response) => {
                if let Some(limit) = response.ratelimit_limit_requests() {
                    self.observe_limit(&request.url, limit).await;
                }
                Ok(response)
            }
            Err(error) => Err(self.on_error(error)),
        }
    }

    /// Send a signed request once and stream its events
    pub async fn send_stream(&self, request: &PreparedRequest) -> QianfanResult<EventStream> {
        self.transport
            .send_stream(request)
            .await
            .map_err(|error| self.on_error(error))
    }

    /// Call a model API with retries, signing and rate limiting every attempt
    #[instrument(skip(self, body), fields(capability = %capability))]
    pub async fn request(
        &self,
        capability: Capability,
        model: Option<&str>,
        endpoint: Option<&str>,
        body: Value,
    ) -> QianfanResult<QfResponse> {
        let url = self.endpoint_url(capability, model, endpoint).await?;
        let response = self
            .execute_with_retry(
                || {
                    let body = body.clone();
                    let url = url.as_str();
                    async move {
                        let request = self.prepare_attempt(url, body).await?;
                        self.send(&request).await
                    }
                },
                None,
            )
            .await?;
        info!(
            status = response.status,
            request_id = response.request_id().unwrap_or_default(),
            "request completed"
        );
        Ok(response)
    }

    /// Streaming variant of [`QianfanClient::request`]
    ///
    /// Sets `"stream": true` on object bodies. Retries cover the call up to
    /// the first byte of the response; errors inside the stream surface
    /// from the stream itself.
    #[instrument(skip(self, body), fields(capability = %capability))]
    pub async fn request_stream(
        &self,
        capability: Capability,
        model: Option<&str>,
        endpoint: Option<&str>,
        mut body: Value,
    ) -> QianfanResult<EventStream> {
        if let Value::Object(map) = &mut body {
            map.insert("stream".to_string(), Value::Bool(true));
        }
        let url = self.endpoint_url(capability, model, endpoint).await?;
        self.execute_with_retry(
            || {
                let body = body.clone();
                let url = url.as_str();
                async move {
                    let request = self.prepare_attempt(url, body).await?;
                    self.send_stream(&request).await
                }
            },
            None,
        )
        .await
    }

    /// One attempt's request: quota is keyed on the URL without its query,
    /// the same key server-reported limits are applied to, and signing
    /// happens after any rate-limit wait
    async fn prepare_attempt(&self, url: &str, body: Value) -> QianfanResult<PreparedRequest> {
        let mut request = PreparedRequest::post(url)?.with_json(body);
        self.acquire_quota(&request.url).await;
        self.signer.sign(&mut request).await?;
        Ok(request)
    }

    async fn endpoint_url(
        &self,
        capability: Capability,
        model: Option<&str>,
        endpoint: Option<&str>,
    ) -> QianfanResult<String> {
        let path = self.resolve_endpoint(capability, model, endpoint).await?;
        Ok(self.resolver.url_for(capability, &path))
    }

    async fn observe_limit(&self, key: &str, limit: u32) {
        if !matches!(self.limiter.config().mode, RateLimitMode::Rpm(_)) {
            return;
        }
        if self.limiter.capacity(key).await != Some(limit) {
            info!(key, limit, "server reported a new request limit");
            self.limiter.update_limit(key, limit).await;
        }
    }

    /// Token rejections become auth errors, retryable when a fresh token
    /// will be fetched for the next attempt
    fn on_error(&self, error: QianfanError) -> QianfanError {
        if !error.is_token_expired() {
            return error;
        }
        let refreshed = self.signer.invalidate_token();
        warn!(code = ?error.error_code(), refreshed, "access token rejected");
        QianfanError::Auth {
            message: format!("access token rejected: {}", error),
            code: error.error_code(),
            retryable: refreshed,
        }
    }
}
