//! Layered configuration resolution
//!
//! Source priority (later sources override earlier):
//! 1. Built-in defaults
//! 2. Native YAML user config (~/.config/modelrelay/config.yaml)
//! 3. Native YAML workspace config (.config/modelrelay/config.yaml)
//! 4. Environment variables

use std::path::Path;
use std::sync::Arc;

use crate::logging::Logger;

use super::file::{ConfigFile, FileConfigProvider};
use super::settings::ServiceConfig;
use super::traits::{ConfigError, ConfigProvider, ConfigResult};

/// Overrides the proxy base URL
pub const ENV_PROXY_URL: &str = "MODELRELAY_PROXY_URL";
/// Overrides the idle timeout (milliseconds)
pub const ENV_IDLE_TIMEOUT_MS: &str = "MODELRELAY_IDLE_TIMEOUT_MS";
/// Overrides the bearer token sent to proxies
pub const ENV_AUTH_TOKEN: &str = "MODELRELAY_AUTH_TOKEN";

/// Merges configuration layers into one `ServiceConfig`
pub struct ConfigResolver {
    layers: Vec<Arc<dyn ConfigProvider>>,
    read_env: bool,
    logger: Arc<dyn Logger>,
}

impl ConfigResolver {
    /// Resolver with no layers and no environment lookup
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            layers: Vec::new(),
            read_env: false,
            logger,
        }
    }

    /// User file, then workspace file, then the environment
    pub fn standard(workspace_root: impl AsRef<Path>, logger: Arc<dyn Logger>) -> Self {
        Self::new(logger)
            .with_layer(Arc::new(FileConfigProvider::user()))
            .with_layer(Arc::new(FileConfigProvider::workspace(workspace_root)))
            .with_env()
    }

    /// Add a layer above the existing ones
    pub fn with_layer(mut self, layer: Arc<dyn ConfigProvider>) -> Self {
        self.layers.push(layer);
        self
    }

    /// Apply environment overrides last
    pub fn with_env(mut self) -> Self {
        self.read_env = true;
        self
    }

    /// Load every layer and merge them over the defaults
    pub async fn resolve(&self) -> ConfigResult<ServiceConfig> {
        let mut config = ServiceConfig::default();

        for layer in &self.layers {
            let file = layer.load().await.map_err(|e| {
                self.logger
                    .error(&format!("[ConfigResolver] {} layer failed: {}", layer.name(), e));
                e
            })?;
            self.logger
                .debug(&format!("[ConfigResolver] applying {} layer", layer.name()));
            config.apply(&file);
        }

        if self.read_env {
            config.apply(&env_layer(|key| std::env::var(key).ok())?);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Build a layer from environment lookups
///
/// Takes the lookup as a function so tests need not mutate the process
/// environment. Empty values count as unset.
pub fn env_layer<F>(lookup: F) -> ConfigResult<ConfigFile>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let idle_timeout_ms = match get(ENV_IDLE_TIMEOUT_MS) {
        Some(raw) => Some(
            raw.trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::invalid(ENV_IDLE_TIMEOUT_MS, e.to_string()))?,
        ),
        None => None,
    };

    Ok(ConfigFile {
        proxy_base_url: get(ENV_PROXY_URL),
        idle_timeout_ms,
        auth_token: get(ENV_AUTH_TOKEN),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigLevel, MemoryConfigProvider};
    use crate::logging::NoOpLogger;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_later_layers_win() {
        let dir = tempdir().unwrap();
        let user_path = dir.path().join("user.yaml");
        fs::write(
            &user_path,
            "proxy_base_url: https://user.example.com\nidle_timeout_ms: 1000\n",
        )
        .unwrap();

        let workspace = MemoryConfigProvider::with_layer(ConfigFile {
            idle_timeout_ms: Some(2000),
            ..Default::default()
        });

        let resolver = ConfigResolver::new(NoOpLogger::shared())
            .with_layer(Arc::new(FileConfigProvider::new(&user_path, ConfigLevel::User)))
            .with_layer(Arc::new(workspace));

        let config = resolver.resolve().await.unwrap();
        assert_eq!(config.proxy_base_url, "https://user.example.com");
        assert_eq!(config.idle_timeout_ms, 2000);
    }

    #[tokio::test]
    async fn test_no_layers_gives_defaults() {
        let config = ConfigResolver::new(NoOpLogger::shared()).resolve().await.unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[tokio::test]
    async fn test_invalid_merged_config_is_rejected() {
        let layer = MemoryConfigProvider::with_layer(ConfigFile {
            proxy_base_url: Some("localhost".to_string()),
            ..Default::default()
        });
        let resolver = ConfigResolver::new(NoOpLogger::shared()).with_layer(Arc::new(layer));
        assert!(matches!(
            resolver.resolve().await,
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_env_layer() {
        let mut env = HashMap::new();
        env.insert(ENV_PROXY_URL, "https://env.example.com");
        env.insert(ENV_IDLE_TIMEOUT_MS, " 2500 ");
        env.insert(ENV_AUTH_TOKEN, "");

        let layer = env_layer(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(layer.proxy_base_url.as_deref(), Some("https://env.example.com"));
        assert_eq!(layer.idle_timeout_ms, Some(2500));
        assert!(layer.auth_token.is_none());

        let bad = env_layer(|k| (k == ENV_IDLE_TIMEOUT_MS).then(|| "soon".to_string()));
        assert!(matches!(bad, Err(ConfigError::InvalidValue { .. })));
    }
}
