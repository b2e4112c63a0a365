//! In-memory configuration provider

use async_trait::async_trait;
use std::sync::RwLock;

use super::file::ConfigFile;
use super::traits::{ConfigProvider, ConfigResult};

/// In-memory configuration layer
#[derive(Debug, Default)]
pub struct MemoryConfigProvider {
    layer: RwLock<ConfigFile>,
}

impl MemoryConfigProvider {
    /// Create an empty layer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider holding `layer`
    pub fn with_layer(layer: ConfigFile) -> Self {
        Self {
            layer: RwLock::new(layer),
        }
    }

    /// Replace the layer
    pub fn set(&self, layer: ConfigFile) {
        let mut guard = match self.layer.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = layer;
    }

    /// Reset to an empty layer
    pub fn clear(&self) {
        self.set(ConfigFile::default());
    }
}

#[async_trait]
impl ConfigProvider for MemoryConfigProvider {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self) -> ConfigResult<ConfigFile> {
        let guard = match self.layer.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(guard.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_config_provider() {
        let provider = MemoryConfigProvider::new();
        assert_eq!(provider.load().await.unwrap(), ConfigFile::default());

        provider.set(ConfigFile {
            proxy_base_url: Some("https://chat.example.com".to_string()),
            ..Default::default()
        });
        let layer = provider.load().await.unwrap();
        assert_eq!(layer.proxy_base_url.as_deref(), Some("https://chat.example.com"));

        provider.clear();
        assert!(provider.load().await.unwrap().proxy_base_url.is_none());
    }
}
