//! Model to endpoint resolution

use super::capability::Capability;
use super::catalog::ServiceCatalog;
use super::static_table;
use crate::error::{QianfanError, QianfanResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Path prefix of model APIs on the inference host
pub const MODEL_API_PREFIX: &str = "/rpc/2.0/ai_custom/v1/wenxinworkshop";
/// Default lifetime of a dynamic table
pub const DEFAULT_ENDPOINT_TTL: Duration = Duration::from_secs(3600);
/// Default bound on waiting for another caller's refresh
pub const DEFAULT_REFRESH_WAIT: Duration = Duration::from_secs(10);
/// Default pause before asking the catalog again after a failed refresh
pub const DEFAULT_REFRESH_COOLDOWN: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct DynamicTable {
    entries: Arc<HashMap<String, String>>,
    fetched_at: Instant,
}

/// Resolves `(capability, model)` pairs to endpoint paths
///
/// Lookup order: explicit endpoint, dynamic table from the service catalog,
/// compiled-in table. Each dynamic table lives for a fixed TTL and is
/// refreshed on the first lookup after it expires. After a failed refresh
/// the catalog is left alone for a cooldown period.
pub struct EndpointResolver {
    base_url: String,
    console_base_url: String,
    catalog: Option<Arc<dyn ServiceCatalog>>,
    tables: RwLock<HashMap<Capability, DynamicTable>>,
    failed_at: RwLock<HashMap<Capability, Instant>>,
    refresh_lock: tokio::sync::Mutex<()>,
    ttl: Duration,
    refresh_wait: Duration,
    refresh_cooldown: Duration,
}

impl EndpointResolver {
    /// Resolver backed by the compiled-in table only
    pub fn new(base_url: impl Into<String>, console_base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            console_base_url: console_base_url.into(),
            catalog: None,
            tables: RwLock::new(HashMap::new()),
            failed_at: RwLock::new(HashMap::new()),
            refresh_lock: tokio::sync::Mutex::new(()),
            ttl: DEFAULT_ENDPOINT_TTL,
            refresh_wait: DEFAULT_REFRESH_WAIT,
            refresh_cooldown: DEFAULT_REFRESH_COOLDOWN,
        }
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn ServiceCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_refresh_wait(mut self, wait: Duration) -> Self {
        self.refresh_wait = wait;
        self
    }

    pub fn with_refresh_cooldown(mut self, cooldown: Duration) -> Self {
        self.refresh_cooldown = cooldown;
        self
    }

    pub fn has_catalog(&self) -> bool {
        self.catalog.is_some()
    }

    /// Resolve the endpoint path for a call
    ///
    /// An explicit endpoint is returned unchanged. Without a model the
    /// capability's default model is used.
    pub async fn resolve(
        &self,
        capability: Capability,
        model: Option<&str>,
        explicit_endpoint: Option<&str>,
    ) -> QianfanResult<String> {
        if let Some(endpoint) = explicit_endpoint.filter(|e| !e.trim().is_empty()) {
            return Ok(endpoint.to_string());
        }

        let model = model
            .filter(|m| !m.trim().is_empty())
            .or_else(|| static_table::default_model(capability))
            .ok_or_else(|| {
                QianfanError::validation_field(
                    format!("a model or endpoint is required for {}", capability),
                    "model",
                )
            })?;
        let key = model.trim().to_lowercase();

        if self.catalog.is_some() && capability.is_model_api() {
            if self.needs_refresh(capability) {
                self.refresh(capability).await;
            }
            if let Some(suffix) = self.dynamic_lookup(capability, &key) {
                debug!(%capability, model, suffix = %suffix, "endpoint from service catalog");
                return Ok(suffix);
            }
        }

        static_table::lookup(capability, &key)
            .map(str::to_string)
            .ok_or_else(|| QianfanError::unsupported_model(capability.as_str(), model))
    }

    /// Absolute URL of an endpoint path
    ///
    /// Absolute URLs pass through untouched.
    pub fn url_for(&self, capability: Capability, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        match capability {
            Capability::Console => {
                format!("{}{}", self.console_base_url.trim_end_matches('/'), path)
            }
            _ => format!(
                "{}{}{}",
                self.base_url.trim_end_matches('/'),
                MODEL_API_PREFIX,
                path
            ),
        }
    }

    /// Forget the dynamic table so the next lookup refreshes it
    pub fn invalidate(&self, capability: Capability) {
        self.failed_at.write().remove(&capability);
        if self.tables.write().remove(&capability).is_some() {
            debug!(%capability, "endpoint table invalidated");
        }
    }

    /// Models currently known through the catalog for a capability
    pub fn dynamic_models(&self, capability: Capability) -> Vec<String> {
        self.tables
            .read()
            .get(&capability)
            .map(|table| table.entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn is_stale(&self, capability: Capability) -> bool {
        self.tables
            .read()
            .get(&capability)
            .is_none_or(|table| table.fetched_at.elapsed() >= self.ttl)
    }

    fn cooling_down(&self, capability: Capability) -> bool {
        self.failed_at
            .read()
            .get(&capability)
            .is_some_and(|at| at.elapsed() < self.refresh_cooldown)
    }

    fn needs_refresh(&self, capability: Capability) -> bool {
        self.is_stale(capability) && !self.cooling_down(capability)
    }

    fn dynamic_lookup(&self, capability: Capability, key: &str) -> Option<String> {
        self.tables
            .read()
            .get(&capability)
            .and_then(|table| table.entries.get(key).cloned())
    }

    async fn refresh(&self, capability: Capability) {
        let Some(catalog) = &self.catalog else {
            return;
        };

        let Ok(_guard) = tokio::time::timeout(self.refresh_wait, self.refresh_lock.lock()).await
        else {
            warn!(%capability, "timed out waiting for endpoint refresh");
            return;
        };
        if !self.needs_refresh(capability) {
            return;
        }

        match catalog.list_services(capability).await {
            Ok(entries) => {
                info!(%capability, count = entries.len(), "endpoint table refreshed");
                self.failed_at.write().remove(&capability);
                self.tables.write().insert(
                    capability,
                    DynamicTable {
                        entries: Arc::new(entries),
                        fetched_at: Instant::now(),
                    },
                );
            }
            Err(error) => {
                self.failed_at.write().insert(capability, Instant::now());
                warn!(%capability, error = %error, "endpoint refresh failed, keeping previous table");
            }
        }
    }
}

impl std::fmt::Debug for EndpointResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointResolver")
            .field("base_url", &self.base_url)
            .field("console_base_url", &self.console_base_url)
            .field("has_catalog", &self.catalog.is_some())
            .field("ttl", &self.ttl)
            .finish()
    }
}
