//! JSON and SSE transport
//!
//! A [`PreparedRequest`] is sent once by [`HttpTransport`]; the answer is
//! either a decoded [`QfResponse`] or a lazy [`EventStream`].

mod http;
mod request;
mod response;
pub mod sse_decoder;
mod stream;

pub use http::HttpTransport;
pub use reqwest::Method;
pub use request::PreparedRequest;
pub use response::{
    QfResponse, RATELIMIT_LIMIT_REQUESTS_HEADER, REQUEST_ID_HEADER, body_error_code,
    MAX_RETRY_AFTER, check_response, retry_after,
};
pub use stream::{EventStream, StreamEvent};
