//! Client configuration

use super::credentials::Credentials;
use crate::error::{QianfanError, QianfanResult};
use crate::recovery::{RateLimitConfig, RetryConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://aip.baidubce.com";
pub const DEFAULT_CONSOLE_BASE_URL: &str = "https://qianfan.baidubce.com";
pub const DEFAULT_IAM_BASE_URL: &str = "https://iam.bj.baidubce.com";
pub const DEFAULT_OAUTH_URL: &str = "https://aip.baidubce.com/oauth/2.0/token";

/// Everything a client needs, loaded from the environment or built in code
///
/// # Example
/// ```
/// use qianfan_core::config::{ClientConfig, Credentials};
/// use std::time::Duration;
///
/// let config = ClientConfig::new(Credentials::iam("ak", "sk"))
///     .with_request_timeout(Duration::from_secs(30));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub credentials: Credentials,
    /// Inference host
    pub base_url: String,
    /// Console (management) host
    pub console_base_url: String,
    pub iam_base_url: String,
    pub oauth_url: String,
    /// Lifetime stated in each `bce-auth-v1` signature
    pub sign_expiration_secs: u64,
    /// Lifetime requested for IAM bearer tokens
    pub bearer_token_expiration_secs: u64,
    /// Token invalidations sooner than this after a refresh are ignored
    #[serde(with = "humantime_serde")]
    pub token_refresh_min_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub endpoint_cache_ttl: Duration,
    /// Consult the service catalog when IAM keys are available
    pub dynamic_endpoints: bool,
    /// Per-attempt timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub retry: RetryConfig,
    pub rate_limit: RateLimitConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            console_base_url: DEFAULT_CONSOLE_BASE_URL.to_string(),
            iam_base_url: DEFAULT_IAM_BASE_URL.to_string(),
            oauth_url: DEFAULT_OAUTH_URL.to_string(),
            sign_expiration_secs: 300,
            bearer_token_expiration_secs: 100_000,
            token_refresh_min_interval: Duration::from_secs(3600),
            endpoint_cache_ttl: Duration::from_secs(3600),
            dynamic_endpoints: true,
            request_timeout: Duration::from_secs(60),
            retry: RetryConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            ..Default::default()
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_console_base_url(mut self, url: impl Into<String>) -> Self {
        self.console_base_url = url.into();
        self
    }

    pub fn with_iam_base_url(mut self, url: impl Into<String>) -> Self {
        self.iam_base_url = url.into();
        self
    }

    pub fn with_oauth_url(mut self, url: impl Into<String>) -> Self {
        self.oauth_url = url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_endpoint_cache_ttl(mut self, ttl: Duration) -> Self {
        self.endpoint_cache_ttl = ttl;
        self
    }

    pub fn with_dynamic_endpoints(mut self, enabled: bool) -> Self {
        self.dynamic_endpoints = enabled;
        self
    }

    pub fn with_token_refresh_min_interval(mut self, interval: Duration) -> Self {
        self.token_refresh_min_interval = interval;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Check the configuration before any network call is made
    pub fn validate(&self) -> QianfanResult<()> {
        if self.credentials.auth_mode().is_none() {
            return Err(QianfanError::validation_field(
                "no credentials configured: set an access key and secret key, \
                 an API key and secret key, or an access token",
                "credentials",
            ));
        }

        for (field, url) in [
            ("base_url", &self.base_url),
            ("console_base_url", &self.console_base_url),
            ("iam_base_url", &self.iam_base_url),
            ("oauth_url", &self.oauth_url),
        ] {
            let parsed = reqwest::Url::parse(url).map_err(|e| {
                QianfanError::validation_field(format!("invalid {} '{}': {}", field, url, e), field)
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(QianfanError::validation_field(
                    format!("{} must use http or https, got '{}'", field, url),
                    field,
                ));
            }
        }

        if self.request_timeout.is_zero() {
            return Err(QianfanError::validation_field(
                "request timeout must be positive",
                "request_timeout",
            ));
        }

        self.retry.validate()
    }
}
