//! Environment variable-based configuration loading

use super::client_config::ClientConfig;
use super::credentials::Credentials;
use crate::error::{QianfanError, QianfanResult};
use crate::recovery::RateLimitConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

pub const ENV_PREFIX: &str = "QIANFAN_";

/// Load configuration from `QIANFAN_*` environment variables
///
/// A `.env` file in the working directory is read first; variables that
/// are already set are not overridden.
pub fn load_from_env() -> QianfanResult<ClientConfig> {
    if let Ok(path) = dotenv::dotenv() {
        debug!(path = %path.display(), "loaded .env file");
    }
    load_from_lookup(|name| env::var(name).ok())
}

/// Load configuration through an arbitrary variable lookup
pub fn load_from_lookup<F>(lookup: F) -> QianfanResult<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |suffix: &str| {
        lookup(&format!("{}{}", ENV_PREFIX, suffix))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let mut config = ClientConfig::default();

    config.credentials = Credentials {
        access_key: get("ACCESS_KEY"),
        secret_key: get("SECRET_KEY"),
        api_key: get("AK"),
        app_secret_key: get("SK"),
        access_token: get("ACCESS_TOKEN"),
        bearer_token: get("BEARER_TOKEN"),
        use_bearer_token: parse_opt::<bool>(&get, "USE_BEARER_TOKEN")?.unwrap_or(false),
    };

    if let Some(url) = get("BASE_URL") {
        config.base_url = url;
    }
    if let Some(url) = get("CONSOLE_API_BASE_URL") {
        config.console_base_url = url;
    }
    if let Some(url) = get("IAM_BASE_URL") {
        config.iam_base_url = url;
    }
    if let Some(url) = get("OAUTH_URL") {
        config.oauth_url = url;
    }

    if let Some(secs) = parse_opt::<u64>(&get, "IAM_SIGN_EXPIRATION_SEC")? {
        config.sign_expiration_secs = secs;
    }
    if let Some(secs) = parse_opt::<u64>(&get, "BEARER_TOKEN_EXPIRED_INTERVAL")? {
        config.bearer_token_expiration_secs = secs;
    }
    if let Some(interval) = parse_secs(&get, "ACCESS_TOKEN_REFRESH_MIN_INTERVAL")? {
        config.token_refresh_min_interval = interval;
    }
    if let Some(ttl) = parse_secs(&get, "ENDPOINT_CACHE_TTL")? {
        config.endpoint_cache_ttl = ttl;
    }
    if let Some(enabled) = parse_opt::<bool>(&get, "ENABLE_DYNAMIC_ENDPOINTS")? {
        config.dynamic_endpoints = enabled;
    }
    if let Some(timeout) = parse_secs(&get, "REQUEST_TIMEOUT")? {
        config.request_timeout = timeout;
    }

    let mut retry = config.retry.clone();
    if let Some(count) = parse_opt::<u32>(&get, "LLM_API_RETRY_COUNT")? {
        retry = retry.with_max_attempts(count);
    }
    if let Some(timeout) = parse_secs(&get, "LLM_API_RETRY_TIMEOUT")? {
        retry = retry.with_retry_timeout(timeout);
    }
    if let Some(wait) = parse_secs(&get, "LLM_API_RETRY_MAX_WAIT_INTERVAL")? {
        retry = retry.with_max_wait_interval(wait);
    }
    if let Some(factor) = parse_opt::<f64>(&get, "LLM_API_RETRY_BACKOFF_FACTOR")? {
        retry = retry.with_backoff_factor(factor);
    }
    if let Some(list) = get("LLM_RETRY_ERR_CODES") {
        retry = retry.with_retryable_codes(parse_list::<i64>("LLM_RETRY_ERR_CODES", &list)?);
    }
    config.retry = retry;

    let qps = parse_opt::<u32>(&get, "QPS_LIMIT")?.unwrap_or(0);
    let rpm = parse_opt::<u32>(&get, "RPM_LIMIT")?.unwrap_or(0);
    config.rate_limit = RateLimitConfig::new(qps, rpm)?;

    Ok(config)
}

fn invalid(suffix: &str, value: &str) -> QianfanError {
    QianfanError::validation_field(
        format!("invalid value '{}' for {}{}", value, ENV_PREFIX, suffix),
        format!("{}{}", ENV_PREFIX, suffix),
    )
}

fn parse_opt<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    suffix: &str,
) -> QianfanResult<Option<T>> {
    get(suffix)
        .map(|value| {
            let normalized = if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
                value.to_ascii_lowercase()
            } else {
                value.clone()
            };
            normalized.parse::<T>().map_err(|_| invalid(suffix, &value))
        })
        .transpose()
}

/// Seconds, fractional values allowed
fn parse_secs(
    get: &impl Fn(&str) -> Option<String>,
    suffix: &str,
) -> QianfanResult<Option<Duration>> {
    match parse_opt::<f64>(get, suffix)? {
        Some(secs) => Duration::try_from_secs_f64(secs)
            .map(Some)
            .map_err(|_| invalid(suffix, &secs.to_string())),
        None => Ok(None),
    }
}

fn parse_list<T: FromStr>(suffix: &str, list: &str) -> QianfanResult<Vec<T>> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| item.parse::<T>().map_err(|_| invalid(suffix, item)))
        .collect()
}
