//! Token bucket

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

#[derive(Debug)]
struct BucketState {
    capacity: u32,
    tokens: f64,
    last_refill: Instant,
}

impl BucketState {
    fn refill(&mut self, period: Duration) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        let rate = self.capacity as f64 / period.as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(self.capacity as f64);
        self.last_refill = now;
    }

    /// Time until one whole token is available
    fn wait_time(&self, period: Duration) -> Duration {
        let rate = self.capacity as f64 / period.as_secs_f64();
        let needed = (1.0 - self.tokens).max(0.0);
        Duration::try_from_secs_f64(needed / rate).map_or(period, |wait| wait.min(period))
    }
}

/// A token bucket refilled continuously at `capacity / period`
///
/// Starts full. Never holds more than `capacity` tokens nor fewer than zero.
#[derive(Debug)]
pub struct TokenBucket {
    period: Duration,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Create a full bucket; `capacity` must be non-zero
    pub fn new(capacity: u32, period: Duration) -> Self {
        Self {
            period,
            state: Mutex::new(BucketState {
                capacity,
                tokens: capacity as f64,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Take one token, sleeping until one is available
    ///
    /// Returns how long the caller waited.
    pub async fn acquire(&self) -> Duration {
        let start = Instant::now();
        loop {
            let mut state = self.state.lock().await;
            state.refill(self.period);
            if state.tokens >= 1.0 {
                state.tokens -= 1.0;
                return start.elapsed();
            }
            let wait = state.wait_time(self.period);
            drop(state);
            sleep(wait).await;
        }
    }

    /// Take one token if available right now
    pub async fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().await;
        state.refill(self.period);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Tokens currently available
    pub async fn available(&self) -> f64 {
        let mut state = self.state.lock().await;
        state.refill(self.period);
        state.tokens
    }

    pub async fn capacity(&self) -> u32 {
        self.state.lock().await.capacity
    }

    /// Change the capacity going forward; stored tokens are clamped
    pub async fn set_capacity(&self, capacity: u32) {
        let mut state = self.state.lock().await;
        state.refill(self.period);
        state.capacity = capacity;
        state.tokens = state.tokens.min(capacity as f64);
    }
}
