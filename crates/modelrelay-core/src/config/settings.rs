//! Resolved service settings

use std::collections::HashMap;
use std::time::Duration;

use crate::catalog::{ModelCatalog, ProviderKind};
use crate::proxy::ProxyEndpoint;

use super::file::ConfigFile;
use super::traits::{ConfigError, ConfigResult};

/// Default proxy base URL (local dev server)
pub const DEFAULT_PROXY_BASE_URL: &str = "http://localhost:3000";
/// Default idle timeout between stream reads
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 30_000;
/// Default TCP connect timeout
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Fully resolved settings for the streaming service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub proxy_base_url: String,
    pub idle_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub auth_token: Option<String>,
    /// Fallback overrides applied on top of the catalog
    pub fallbacks: HashMap<String, String>,
    /// Proxy path overrides keyed by provider id
    pub endpoints: HashMap<String, String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            proxy_base_url: DEFAULT_PROXY_BASE_URL.to_string(),
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            auth_token: None,
            fallbacks: HashMap::new(),
            endpoints: HashMap::new(),
        }
    }
}

impl ServiceConfig {
    /// Default settings pointed at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            proxy_base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the idle timeout
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Override the fallback of one model
    pub fn with_fallback(mut self, model: impl Into<String>, fallback: impl Into<String>) -> Self {
        self.fallbacks.insert(model.into(), fallback.into());
        self
    }

    /// Override the proxy path of one provider
    pub fn with_endpoint(mut self, provider: ProviderKind, path: impl Into<String>) -> Self {
        self.endpoints.insert(provider.id().to_string(), path.into());
        self
    }

    /// Idle timeout as a duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Connect timeout as a duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Lay `layer` over these settings
    pub fn apply(&mut self, layer: &ConfigFile) {
        if let Some(url) = &layer.proxy_base_url {
            self.proxy_base_url = url.clone();
        }
        if let Some(ms) = layer.idle_timeout_ms {
            self.idle_timeout_ms = ms;
        }
        if let Some(ms) = layer.connect_timeout_ms {
            self.connect_timeout_ms = ms;
        }
        if let Some(token) = &layer.auth_token {
            self.auth_token = Some(token.clone());
        }
        self.fallbacks
            .extend(layer.fallbacks.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.endpoints
            .extend(layer.endpoints.iter().map(|(k, v)| (k.to_lowercase(), v.clone())));
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        let url = self.proxy_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::invalid(
                "proxy_base_url",
                format!("expected an http(s) URL, got {:?}", self.proxy_base_url),
            ));
        }
        if self.idle_timeout_ms == 0 {
            return Err(ConfigError::invalid("idle_timeout_ms", "must be greater than zero"));
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::invalid("connect_timeout_ms", "must be greater than zero"));
        }
        for provider in self.endpoints.keys() {
            if ProviderKind::from_id(provider).is_none() {
                return Err(ConfigError::invalid("endpoints", format!("unknown provider {}", provider)));
            }
        }
        Ok(())
    }

    /// Proxy path for a provider, honouring overrides
    pub fn endpoint_path(&self, provider: ProviderKind) -> &str {
        self.endpoints
            .get(provider.id())
            .map(String::as_str)
            .unwrap_or_else(|| provider.default_endpoint())
    }

    /// Absolute endpoint for a provider
    pub fn endpoint(&self, provider: ProviderKind) -> ProxyEndpoint {
        ProxyEndpoint::new(self.proxy_base_url.clone(), self.endpoint_path(provider))
    }

    /// The catalog with this config's fallback overrides applied
    pub fn catalog(&self, base: &ModelCatalog) -> ConfigResult<ModelCatalog> {
        Ok(base.with_overrides(&self.fallbacks)?)
    }
}
