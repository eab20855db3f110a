//! Access token caching with single-flight refresh

use super::exchange::TokenExchange;
use crate::error::QianfanResult;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Default margin subtracted from a token's lifetime
pub const DEFAULT_SAFETY_OFFSET: Duration = Duration::from_secs(10);

/// A cached access token
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub value: String,
    pub issued_at: DateTime<Utc>,
    /// Already reduced by the safety offset
    pub expires_at: DateTime<Utc>,
}

impl Token {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

/// Token as returned by an exchange
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedToken {
    pub value: String,
    pub expires_in: Duration,
}

/// Caches the token produced by a [`TokenExchange`]
///
/// Reads take a snapshot without waiting. When the token is missing or
/// expired, exactly one caller performs the exchange while the others wait
/// for its result.
pub struct TokenCache {
    exchange: Arc<dyn TokenExchange>,
    current: RwLock<Option<Token>>,
    refresh_lock: tokio::sync::Mutex<()>,
    last_refresh: Mutex<Option<Instant>>,
    safety_offset: Duration,
    min_refresh_interval: Duration,
}

impl TokenCache {
    pub fn new(exchange: Arc<dyn TokenExchange>) -> Self {
        Self {
            exchange,
            current: RwLock::new(None),
            refresh_lock: tokio::sync::Mutex::new(()),
            last_refresh: Mutex::new(None),
            safety_offset: DEFAULT_SAFETY_OFFSET,
            min_refresh_interval: Duration::ZERO,
        }
    }

    pub fn with_safety_offset(mut self, offset: Duration) -> Self {
        self.safety_offset = offset;
        self
    }

    /// Ignore invalidations arriving sooner than `interval` after a refresh
    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// Current token if it is still valid
    pub fn snapshot(&self) -> Option<Token> {
        self.current
            .read()
            .as_ref()
            .filter(|token| token.is_valid())
            .cloned()
    }

    /// Return a valid token, exchanging credentials when needed
    ///
    /// A failed exchange leaves the cached state untouched.
    pub async fn get_token(&self) -> QianfanResult<String> {
        if let Some(token) = self.snapshot() {
            return Ok(token.value);
        }

        let _guard = self.refresh_lock.lock().await;
        // Another caller may have refreshed while we waited
        if let Some(token) = self.snapshot() {
            debug!("token refreshed by a concurrent caller");
            return Ok(token.value);
        }

        debug!(exchange = self.exchange.name(), "exchanging credentials for a token");
        let issued = self.exchange.exchange().await?;

        let issued_at = Utc::now();
        let lifetime = issued.expires_in.saturating_sub(self.safety_offset);
        let expires_at = chrono::Duration::from_std(lifetime)
            .ok()
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let token = Token {
            value: issued.value,
            issued_at,
            expires_at,
        };

        info!(expires_at = %token.expires_at, "access token refreshed");
        *self.current.write() = Some(token.clone());
        *self.last_refresh.lock() = Some(Instant::now());
        Ok(token.value)
    }

    /// Drop the cached token so the next call exchanges again
    ///
    /// Returns `false` when ignored because the last refresh is more recent
    /// than the minimum refresh interval.
    pub fn invalidate(&self) -> bool {
        let recent = self
            .last_refresh
            .lock()
            .is_some_and(|at| at.elapsed() < self.min_refresh_interval);
        if recent {
            debug!("token invalidation ignored, refreshed too recently");
            return false;
        }
        info!("access token invalidated");
        *self.current.write() = None;
        true
    }
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache")
            .field("exchange", &self.exchange.name())
            .field("has_token", &self.current.read().is_some())
            .field("safety_offset", &self.safety_offset)
            .finish()
    }
}
