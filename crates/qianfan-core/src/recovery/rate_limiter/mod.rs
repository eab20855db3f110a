//! Per-key rate limiting for API calls
//!
//! Every key (typically the resolved endpoint) owns one token bucket,
//! created lazily on first use.

mod bucket;
mod limiter;
mod types;


pub use bucket::TokenBucket;
pub use limiter::RateLimiter;
pub use types::{RateLimitConfig, RateLimitMode};
