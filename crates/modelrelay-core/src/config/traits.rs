//! Configuration provider trait

use async_trait::async_trait;

use super::file::ConfigFile;

/// One source of configuration
///
/// Implementations:
/// - `MemoryConfigProvider`: In-memory for testing and embedding
/// - `FileConfigProvider`: YAML file (~/.config/modelrelay/config.yaml)
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Source name for logs
    fn name(&self) -> &str;

    /// Read this source's layer; a missing source is an empty layer
    async fn load(&self) -> ConfigResult<ConfigFile>;
}

/// Errors that can occur during configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Catalog error: {0}")]
    Catalog(#[from] crate::catalog::CatalogError),
}

impl ConfigError {
    /// Create an invalid value error
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
