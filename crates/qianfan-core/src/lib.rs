//! Qianfan request core
//!
//! This crate provides the authenticated, rate-limited request layer for the
//! Qianfan large-model platform: request signing and token caching, endpoint
//! resolution, per-key rate limiting, retry with backoff, and JSON / SSE
//! transport. Request builders for individual endpoints sit on top of it.

pub mod auth;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod recovery;
pub mod transport;

// Re-export commonly used types
pub use auth::{BceSigner, Signer, TokenCache, TokenPlacement, TokenSource};
pub use config::{ClientConfig, Credentials, load_from_env};
pub use endpoint::{Capability, EndpointResolver};
pub use error::{QianfanError, QianfanResult};
pub use recovery::{RateLimitConfig, RateLimiter, RetryConfig, RetryPolicy};
pub use transport::{EventStream, HttpTransport, PreparedRequest, QfResponse, StreamEvent};
