//! Per-key rate limiter registry

use super::bucket::TokenBucket;
use super::types::RateLimitConfig;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Rate limiter holding one token bucket per key
///
/// Buckets are created on first use; concurrent first callers for the same
/// key always end up sharing a single bucket.
#[derive(Debug, Default)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: DashMap<String, Arc<TokenBucket>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: DashMap::new(),
        }
    }

    /// Create a limiter that never waits
    pub fn unlimited() -> Self {
        Self::new(RateLimitConfig::unlimited())
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        !self.config.is_unlimited()
    }

    fn bucket(&self, key: &str) -> Arc<TokenBucket> {
        if let Some(bucket) = self.buckets.get(key) {
            return bucket.clone();
        }
        self.buckets
            .entry(key.to_string())
            .or_insert_with(|| {
                debug!(key, capacity = self.config.capacity(), "creating rate limit bucket");
                Arc::new(TokenBucket::new(
                    self.config.capacity(),
                    self.config.refill_period(),
                ))
            })
            .clone()
    }

    /// Wait until `key` has quota for one request
    ///
    /// Returns the wait duration if the caller had to wait noticeably.
    pub async fn acquire(&self, key: &str) -> Option<Duration> {
        if !self.is_enabled() {
            return None;
        }
        let waited = self.bucket(key).acquire().await;
        if waited > Duration::from_millis(5) {
            debug!(key, waited_secs = waited.as_secs_f64(), "rate limiter delayed request");
            Some(waited)
        } else {
            None
        }
    }

    /// Take quota for `key` without waiting
    pub async fn try_acquire(&self, key: &str) -> bool {
        if !self.is_enabled() {
            return true;
        }
        self.bucket(key).try_acquire().await
    }

    /// Whole tokens currently available for `key`, `None` when unlimited
    pub async fn available(&self, key: &str) -> Option<u32> {
        if !self.is_enabled() {
            return None;
        }
        let tokens = self.bucket(key).available().await;
        Some(if tokens.is_finite() && tokens >= 0.0 {
            tokens.floor() as u32
        } else {
            0
        })
    }

    /// Current capacity of the bucket for `key`
    pub async fn capacity(&self, key: &str) -> Option<u32> {
        if !self.is_enabled() {
            return None;
        }
        Some(self.bucket(key).capacity().await)
    }

    /// Adjust the capacity for `key`, e.g. from a server-reported limit
    pub async fn update_limit(&self, key: &str, capacity: u32) {
        if !self.is_enabled() {
            return;
        }
        if capacity == 0 {
            warn!(key, "ignoring zero rate limit update");
            return;
        }
        let bucket = self.bucket(key);
        if bucket.capacity().await != capacity {
            info!(key, capacity, "updating rate limit capacity");
            bucket.set_capacity(capacity).await;
        }
    }

    /// Number of keys with a bucket
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}
