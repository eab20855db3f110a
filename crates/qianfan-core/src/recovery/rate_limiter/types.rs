//! Rate limiter configuration types

use crate::error::{QianfanError, QianfanResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Refill period of a QPS bucket
pub const QPS_PERIOD: Duration = Duration::from_secs(1);
/// Refill period of an RPM bucket
pub const RPM_PERIOD: Duration = Duration::from_secs(60);

/// How requests are limited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "limit")]
pub enum RateLimitMode {
    /// No limiting, `acquire` returns immediately
    #[default]
    Unlimited,
    /// Requests per second
    Qps(u32),
    /// Requests per minute
    Rpm(u32),
}

/// Rate limit configuration shared by every bucket of a limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub mode: RateLimitMode,
}

impl RateLimitConfig {
    /// Build a config from the two mutually exclusive limits
    ///
    /// Both zero means unlimited; setting both is rejected.
    pub fn new(qps: u32, rpm: u32) -> QianfanResult<Self> {
        match (qps, rpm) {
            (0, 0) => Ok(Self::unlimited()),
            (qps, 0) => Ok(Self::qps(qps)),
            (0, rpm) => Ok(Self::rpm(rpm)),
            (qps, rpm) => Err(QianfanError::validation(format!(
                "QPS limit ({qps}) and RPM limit ({rpm}) are mutually exclusive"
            ))),
        }
    }

    /// Limit to `limit` requests per second
    pub fn qps(limit: u32) -> Self {
        Self {
            mode: if limit == 0 {
                RateLimitMode::Unlimited
            } else {
                RateLimitMode::Qps(limit)
            },
        }
    }

    /// Limit to `limit` requests per minute
    pub fn rpm(limit: u32) -> Self {
        Self {
            mode: if limit == 0 {
                RateLimitMode::Unlimited
            } else {
                RateLimitMode::Rpm(limit)
            },
        }
    }

    /// No limiting
    pub fn unlimited() -> Self {
        Self {
            mode: RateLimitMode::Unlimited,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self.mode, RateLimitMode::Unlimited)
    }

    /// Bucket capacity, 0 when unlimited
    pub fn capacity(&self) -> u32 {
        match self.mode {
            RateLimitMode::Unlimited => 0,
            RateLimitMode::Qps(limit) | RateLimitMode::Rpm(limit) => limit,
        }
    }

    /// Time in which an empty bucket refills completely
    pub fn refill_period(&self) -> Duration {
        match self.mode {
            RateLimitMode::Rpm(_) => RPM_PERIOD,
            RateLimitMode::Unlimited | RateLimitMode::Qps(_) => QPS_PERIOD,
        }
    }
}
