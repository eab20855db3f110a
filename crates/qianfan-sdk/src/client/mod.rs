//! SDK client implementation

mod builder;
mod execute;

pub use builder::QianfanClientBuilder;

use qianfan_core::auth::Signer;
use qianfan_core::config::ClientConfig;
use qianfan_core::endpoint::EndpointResolver;
use qianfan_core::recovery::RateLimiter;
use qianfan_core::transport::HttpTransport;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Client for the Qianfan platform
///
/// Owns the token cache, the endpoint tables and the rate-limit buckets, so
/// every clone of a client shares them and separate clients never do.
///
/// # Examples
///
/// ```no_run
/// use qianfan_sdk::{ClientConfig, Credentials, QianfanClient};
///
/// let client = QianfanClient::builder()
///     .config(ClientConfig::new(Credentials::iam("ak", "sk")))
///     .build()?;
/// # Ok::<(), qianfan_sdk::QianfanError>(())
/// ```
#[derive(Debug, Clone)]
pub struct QianfanClient {
    pub(crate) config: Arc<ClientConfig>,
    pub(crate) signer: Signer,
    pub(crate) resolver: Arc<EndpointResolver>,
    pub(crate) limiter: Arc<RateLimiter>,
    pub(crate) transport: HttpTransport,
    pub(crate) cancel_token: Option<CancellationToken>,
}

impl QianfanClient {
    pub fn builder() -> QianfanClientBuilder {
        QianfanClientBuilder::new()
    }

    /// Build a client from `QIANFAN_*` environment variables and `.env`
    pub fn from_env() -> qianfan_core::QianfanResult<Self> {
        QianfanClientBuilder::from_env()?.build()
    }

    /// Build a client from an explicit configuration
    pub fn new(config: ClientConfig) -> qianfan_core::QianfanResult<Self> {
        QianfanClientBuilder::new().config(config).build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    pub fn resolver(&self) -> &EndpointResolver {
        &self.resolver
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }
}
