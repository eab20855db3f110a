//! Client construction

use super::QianfanClient;
use qianfan_core::auth::{
    BceSigner, Clock, IamBearerExchange, OAuthExchange, Signer, TokenCache, TokenExchange,
    TokenPlacement, TokenSource,
};
use qianfan_core::config::{AuthMode, ClientConfig, load_from_env};
use qianfan_core::endpoint::{ConsoleServiceCatalog, EndpointResolver, ServiceCatalog};
use qianfan_core::error::{QianfanError, QianfanResult};
use qianfan_core::recovery::RateLimiter;
use qianfan_core::transport::HttpTransport;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Builder for [`QianfanClient`]
#[derive(Default)]
pub struct QianfanClientBuilder {
    config: ClientConfig,
    http_client: Option<reqwest::Client>,
    catalog: Option<Arc<dyn ServiceCatalog>>,
    clock: Option<Clock>,
    cancel_token: Option<CancellationToken>,
}

impl QianfanClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the environment configuration
    pub fn from_env() -> QianfanResult<Self> {
        Ok(Self::new().config(load_from_env()?))
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing connection pool
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Use a custom service catalog instead of the console one
    pub fn service_catalog(mut self, catalog: Arc<dyn ServiceCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Pin the clock used for request signatures
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Cancelling the token aborts pending retries of every request
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    pub fn build(self) -> QianfanResult<QianfanClient> {
        let config = self.config;
        config.validate()?;

        let transport = match self.http_client {
            Some(client) => HttpTransport::with_client(client, config.request_timeout),
            None => HttpTransport::new(config.request_timeout)?,
        };

        let signer = build_signer(&config, &transport, self.clock.clone())?;

        let catalog = match self.catalog {
            Some(catalog) => Some(catalog),
            None if config.dynamic_endpoints && config.credentials.has_iam_keys() => {
                let console_signer = Signer::Hmac(iam_signer(&config, self.clock)?);
                Some(Arc::new(ConsoleServiceCatalog::new(
                    transport.clone(),
                    console_signer,
                    config.console_base_url.clone(),
                )) as Arc<dyn ServiceCatalog>)
            }
            None => {
                debug!("no console credentials, using the compiled-in endpoint table");
                None
            }
        };

        let mut resolver = EndpointResolver::new(&config.base_url, &config.console_base_url)
            .with_ttl(config.endpoint_cache_ttl);
        if let Some(catalog) = catalog {
            resolver = resolver.with_catalog(catalog);
        }

        info!(
            auth = signer.kind(),
            base_url = %config.base_url,
            rate_limit = ?config.rate_limit.mode,
            "qianfan client ready"
        );

        Ok(QianfanClient {
            limiter: Arc::new(RateLimiter::new(config.rate_limit)),
            resolver: Arc::new(resolver),
            signer,
            transport,
            cancel_token: self.cancel_token,
            config: Arc::new(config),
        })
    }
}

fn required<'a>(value: &'a Option<String>, field: &str) -> QianfanResult<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| QianfanError::validation_field(format!("{} is required", field), field))
}

fn iam_signer(config: &ClientConfig, clock: Option<Clock>) -> QianfanResult<BceSigner> {
    let credentials = &config.credentials;
    let signer = BceSigner::new(
        required(&credentials.access_key, "access_key")?,
        required(&credentials.secret_key, "secret_key")?,
        config.sign_expiration_secs,
    )?;
    Ok(match clock {
        Some(clock) => signer.with_clock(clock),
        None => signer,
    })
}

fn token_cache(config: &ClientConfig, exchange: Arc<dyn TokenExchange>) -> Arc<TokenCache> {
    Arc::new(
        TokenCache::new(exchange).with_min_refresh_interval(config.token_refresh_min_interval),
    )
}

fn build_signer(
    config: &ClientConfig,
    transport: &HttpTransport,
    clock: Option<Clock>,
) -> QianfanResult<Signer> {
    let credentials = &config.credentials;
    let mode = credentials.auth_mode().ok_or_else(|| {
        QianfanError::validation_field("no usable credentials", "credentials")
    })?;

    let signer = match mode {
        AuthMode::StaticBearer => Signer::Bearer {
            source: TokenSource::Static(
                required(&credentials.bearer_token, "bearer_token")?.to_string(),
            ),
            placement: TokenPlacement::Header,
        },
        AuthMode::StaticAccessToken => Signer::Bearer {
            source: TokenSource::Static(
                required(&credentials.access_token, "access_token")?.to_string(),
            ),
            placement: TokenPlacement::Query,
        },
        AuthMode::IamSignature => Signer::Hmac(iam_signer(config, clock)?),
        AuthMode::IamBearer => {
            let exchange = IamBearerExchange::new(
                transport.client().clone(),
                config.iam_base_url.clone(),
                iam_signer(config, clock)?,
                config.bearer_token_expiration_secs,
            );
            Signer::Bearer {
                source: TokenSource::Cached(token_cache(config, Arc::new(exchange))),
                placement: TokenPlacement::Header,
            }
        }
        AuthMode::OAuth => {
            let exchange = OAuthExchange::new(
                transport.client().clone(),
                config.oauth_url.clone(),
                required(&credentials.api_key, "api_key")?,
                required(&credentials.app_secret_key, "app_secret_key")?,
            )?;
            Signer::Bearer {
                source: TokenSource::Cached(token_cache(config, Arc::new(exchange))),
                placement: TokenPlacement::Query,
            }
        }
    };
    Ok(signer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qianfan_core::config::Credentials;

    #[test]
    fn test_signer_selection() {
        let kind = |credentials: Credentials| {
            QianfanClientBuilder::new()
                .config(ClientConfig::new(credentials).with_dynamic_endpoints(false))
                .build()
                .unwrap()
                .signer()
                .kind()
        };

        assert_eq!(kind(Credentials::iam("ak", "sk")), "bce-auth-v1");
        assert_eq!(kind(Credentials::iam("ak", "sk").with_bearer_exchange(true)), "cached-token");
        assert_eq!(kind(Credentials::oauth("api", "secret")), "cached-token");
        assert_eq!(kind(Credentials::access_token("24.x")), "static-token");
        assert_eq!(kind(Credentials::bearer("bce-v3/x")), "static-token");
    }

    #[test]
    fn test_build_without_credentials_fails() {
        let error = QianfanClientBuilder::new().build().unwrap_err();
        assert!(error.is_validation());
    }

    #[test]
    fn test_catalog_only_with_iam_keys() {
        let client = QianfanClient::new(ClientConfig::new(Credentials::iam("ak", "sk"))).unwrap();
        assert!(client.resolver().has_catalog());

        let client = QianfanClient::new(ClientConfig::new(Credentials::oauth("api", "sk"))).unwrap();
        assert!(!client.resolver().has_catalog());
    }
}
