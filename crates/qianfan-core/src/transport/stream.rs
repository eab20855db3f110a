//! Lazy sequence of decoded streaming events

use super::response::body_error_code;
use super::sse_decoder::{SseDecoder, SseEvent};
use crate::error::{QianfanError, QianfanResult};
use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::{debug, warn};

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, String>> + Send>>;

/// One decoded streaming answer
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    /// Same schema as a non-streaming response body
    pub body: Value,
    /// `is_end` flag reported by the service
    pub is_end: bool,
    /// Whether further events are expected
    pub has_more: bool,
}

impl StreamEvent {
    pub fn from_body(body: Value) -> Self {
        let is_end = body.get("is_end").and_then(Value::as_bool).unwrap_or(false);
        Self {
            body,
            is_end,
            has_more: !is_end,
        }
    }

    /// A single answer delivered without streaming
    pub(crate) fn complete(body: Value) -> Self {
        Self {
            body,
            is_end: true,
            has_more: false,
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> QianfanResult<T> {
        Ok(serde_json::from_value(self.body.clone())?)
    }
}

/// Pull-based stream of [`StreamEvent`]s over an SSE connection
///
/// Single pass and not restartable. The stream ends when the connection
/// closes or a `[DONE]` frame arrives. An error ends it as well. Calling
/// [`EventStream::close`] or dropping the stream releases the connection.
pub struct EventStream {
    inner: Option<ByteStream>,
    decoder: SseDecoder,
    pending: VecDeque<SseEvent>,
    /// Event decoded ahead of time, yielded first
    ready: Option<StreamEvent>,
    finished: bool,
    url: String,
}

impl EventStream {
    /// Wrap a byte stream carrying SSE frames
    pub fn new<S, E>(bytes: S, url: impl Into<String>) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: std::fmt::Display,
    {
        Self {
            inner: Some(Box::pin(bytes.map(|chunk| chunk.map_err(|e| e.to_string())))),
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            ready: None,
            finished: false,
            url: url.into(),
        }
    }

    /// A stream yielding exactly one already decoded event
    pub fn single(event: StreamEvent, url: impl Into<String>) -> Self {
        Self {
            inner: None,
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            ready: Some(event),
            finished: false,
            url: url.into(),
        }
    }

    /// Stop reading and release the connection
    pub fn close(&mut self) {
        if self.inner.take().is_some() {
            debug!(url = %self.url, "event stream closed by caller");
        }
        self.pending.clear();
        self.ready = None;
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn finish(&mut self) {
        self.inner = None;
        self.pending.clear();
        self.finished = true;
    }

    fn decode(&self, event: &SseEvent) -> QianfanResult<StreamEvent> {
        let body: Value = serde_json::from_str(&event.data).map_err(|e| {
            QianfanError::stream(format!("malformed event from {}: {}", self.url, e))
        })?;
        if let Some(code) = body_error_code(&body) {
            let message = body
                .get("error_msg")
                .and_then(Value::as_str)
                .unwrap_or("error inside event stream");
            return Err(QianfanError::api(200, Some(code), message));
        }
        Ok(StreamEvent::from_body(body))
    }
}

impl Stream for EventStream {
    type Item = QianfanResult<StreamEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        loop {
            if this.finished {
                return Poll::Ready(None);
            }

            if let Some(event) = this.ready.take() {
                return Poll::Ready(Some(Ok(event)));
            }

            if let Some(event) = this.pending.pop_front() {
                if event.is_done() {
                    debug!(url = %this.url, "event stream done");
                    this.finish();
                    return Poll::Ready(None);
                }
                let decoded = this.decode(&event);
                if decoded.is_err() {
                    this.finish();
                }
                return Poll::Ready(Some(decoded));
            }

            let Some(inner) = this.inner.as_mut() else {
                this.finished = true;
                return Poll::Ready(None);
            };

            match inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    this.pending.extend(this.decoder.feed(&chunk));
                }
                Poll::Ready(Some(Err(message))) => {
                    warn!(url = %this.url, error = %message, "event stream interrupted");
                    this.finish();
                    return Poll::Ready(Some(Err(QianfanError::stream(format!(
                        "connection to {} failed mid-stream: {}",
                        this.url, message
                    )))));
                }
                Poll::Ready(None) => {
                    this.inner = None;
                    if this.decoder.has_remaining() {
                        debug!(url = %this.url, "flushing unterminated final frame");
                        if let Some(event) = this.decoder.finish() {
                            this.pending.push_back(event);
                        }
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        if self.inner.is_some() {
            debug!(url = %self.url, "event stream dropped before the end");
        }
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("url", &self.url)
            .field("pending", &self.pending.len())
            .field("finished", &self.finished)
            .finish()
    }
}
