//! Service catalog listing the endpoints deployed for an account

use super::capability::Capability;
use crate::auth::Signer;
use crate::error::{QianfanError, QianfanResult};
use crate::transport::{HttpTransport, PreparedRequest};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::debug;

/// Path segment after which endpoint suffixes start
pub const MODEL_API_SEGMENT: &str = "/wenxinworkshop";

/// Source of dynamic model endpoints
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    /// Lower-case model name to endpoint suffix for one capability
    async fn list_services(&self, capability: Capability) -> QianfanResult<HashMap<String, String>>;
}

#[derive(Debug, Deserialize)]
struct ServiceListResponse {
    result: ServiceListResult,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceListResult {
    #[serde(default)]
    common: Vec<ServiceItem>,
    #[serde(default)]
    custom: Vec<ServiceItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceItem {
    name: String,
    url: String,
    #[serde(default)]
    api_type: String,
}

/// Endpoint suffix of a service URL, the path after `/wenxinworkshop`
pub fn suffix_from_url(url: &str) -> Option<String> {
    let path = match reqwest::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.to_string(),
    };
    let (_, suffix) = path.split_once(MODEL_API_SEGMENT)?;
    (suffix.starts_with('/') && suffix.len() > 1).then(|| suffix.to_string())
}

/// Catalog served by the console management API
#[derive(Debug, Clone)]
pub struct ConsoleServiceCatalog {
    transport: HttpTransport,
    signer: Signer,
    console_base_url: String,
}

impl ConsoleServiceCatalog {
    pub fn new(transport: HttpTransport, signer: Signer, console_base_url: impl Into<String>) -> Self {
        Self {
            transport,
            signer,
            console_base_url: console_base_url.into(),
        }
    }

    fn list_url(&self) -> String {
        format!(
            "{}/wenxinworkshop/service/list",
            self.console_base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ServiceCatalog for ConsoleServiceCatalog {
    async fn list_services(&self, capability: Capability) -> QianfanResult<HashMap<String, String>> {
        let mut request = PreparedRequest::post(self.list_url())?.with_json(json!({}));
        self.signer.sign(&mut request).await?;

        let response = self.transport.send(&request).await?;
        let listing: ServiceListResponse = response.json().map_err(|e| {
            QianfanError::json(format!("unexpected service list response: {}", e))
        })?;

        let services: HashMap<String, String> = listing
            .result
            .common
            .into_iter()
            .chain(listing.result.custom)
            .filter(|item| item.api_type.eq_ignore_ascii_case(capability.as_str()))
            .filter_map(|item| {
                suffix_from_url(&item.url).map(|suffix| (item.name.to_lowercase(), suffix))
            })
            .collect();

        debug!(capability = %capability, count = services.len(), "service catalog listed");
        Ok(services)
    }
}
