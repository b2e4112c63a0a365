//! File-based configuration provider (YAML)
//!
//! Supports user-level (~/.config/modelrelay/config.yaml) and workspace-level
//! (.config/modelrelay/config.yaml) config.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::traits::{ConfigProvider, ConfigResult};

/// One configuration layer, as written in YAML
///
/// Every field is optional; unset fields leave lower layers in place.
///
/// ```yaml
/// proxy_base_url: https://chat.example.com
/// idle_timeout_ms: 20000
/// fallbacks:
///   gpt-4o: claude-3-5-sonnet-20241022
/// endpoints:
///   openai: /.netlify/functions/openai-chat
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Base URL the proxy function paths are appended to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_base_url: Option<String>,

    /// Longest silence tolerated between two reads of a stream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout_ms: Option<u64>,

    /// TCP connect timeout for proxy requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_ms: Option<u64>,

    /// Bearer token forwarded to the proxies (session token)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Fallback overrides: model id -> fallback model id ("" disables)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fallbacks: HashMap<String, String>,

    /// Proxy path overrides: provider id -> path
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub endpoints: HashMap<String, String>,
}

/// Config level (user or workspace)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLevel {
    /// User-level config (~/.config/modelrelay/config.yaml)
    User,
    /// Workspace-level config (.config/modelrelay/config.yaml in workspace root)
    Workspace,
}

impl ConfigLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLevel::User => "user",
            ConfigLevel::Workspace => "workspace",
        }
    }
}

/// File-based configuration provider
///
/// Reads and writes one YAML layer. Reads are cached until `reload()`.
///
/// # Example
///
/// ```no_run
/// use modelrelay_core::config::FileConfigProvider;
///
/// let user_config = FileConfigProvider::user();
/// let workspace_config = FileConfigProvider::workspace("/path/to/app");
/// ```
pub struct FileConfigProvider {
    path: PathBuf,
    level: ConfigLevel,
    cache: RwLock<Option<ConfigFile>>,
}

impl FileConfigProvider {
    /// Create a new file config provider for a specific path
    pub fn new(path: impl Into<PathBuf>, level: ConfigLevel) -> Self {
        Self {
            path: path.into(),
            level,
            cache: RwLock::new(None),
        }
    }

    /// Create a user-level config provider (~/.config/modelrelay/config.yaml)
    pub fn user() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        let path = config_dir.join("modelrelay").join("config.yaml");
        Self::new(path, ConfigLevel::User)
    }

    /// Create a workspace-level config provider (.config/modelrelay/config.yaml)
    pub fn workspace(workspace_root: impl AsRef<Path>) -> Self {
        let path = workspace_root
            .as_ref()
            .join(".config")
            .join("modelrelay")
            .join("config.yaml");
        Self::new(path, ConfigLevel::Workspace)
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the config level
    pub fn level(&self) -> ConfigLevel {
        self.level
    }

    /// Check if the config file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn read_file(&self) -> ConfigResult<ConfigFile> {
        if !self.path.exists() {
            return Ok(ConfigFile::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(ConfigFile::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    fn store_cache(&self, config: &ConfigFile) {
        let mut cache = match self.cache.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *cache = Some(config.clone());
    }

    fn cached(&self) -> Option<ConfigFile> {
        match self.cache.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Get cached or load config
    pub fn get(&self) -> ConfigResult<ConfigFile> {
        if let Some(config) = self.cached() {
            return Ok(config);
        }
        self.reload()
    }

    /// Reload config from disk (invalidate cache)
    pub fn reload(&self) -> ConfigResult<ConfigFile> {
        let config = self.read_file()?;
        self.store_cache(&config);
        Ok(config)
    }

    /// Write `config` to disk, creating parent directories
    pub fn save(&self, config: &ConfigFile) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(config)?;
        fs::write(&self.path, content)?;
        self.store_cache(config);
        Ok(())
    }
}

impl std::fmt::Debug for FileConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigProvider")
            .field("path", &self.path)
            .field("level", &self.level)
            .field("exists", &self.exists())
            .finish()
    }
}

#[async_trait]
impl ConfigProvider for FileConfigProvider {
    fn name(&self) -> &str {
        self.level.as_str()
    }

    async fn load(&self) -> ConfigResult<ConfigFile> {
        self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_is_empty_layer() {
        let dir = tempdir().unwrap();
        let provider = FileConfigProvider::new(dir.path().join("config.yaml"), ConfigLevel::User);

        assert!(!provider.exists());
        assert_eq!(provider.load().await.unwrap(), ConfigFile::default());
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let provider = FileConfigProvider::workspace(dir.path());
        assert!(provider.path().ends_with(".config/modelrelay/config.yaml"));

        let mut layer = ConfigFile {
            proxy_base_url: Some("https://chat.example.com".to_string()),
            idle_timeout_ms: Some(15_000),
            ..Default::default()
        };
        layer.fallbacks.insert("gpt-4o".to_string(), "sonar".to_string());
        provider.save(&layer).unwrap();

        assert!(provider.exists());
        let content = fs::read_to_string(provider.path()).unwrap();
        assert!(content.contains("proxy_base_url: https://chat.example.com"));
        assert!(content.contains("gpt-4o: sonar"));
        assert!(!content.contains("auth_token"));

        let fresh = FileConfigProvider::workspace(dir.path());
        assert_eq!(fresh.load().await.unwrap(), layer);
    }

    #[test]
    fn test_cache_until_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "idle_timeout_ms: 1000\n").unwrap();

        let provider = FileConfigProvider::new(&path, ConfigLevel::User);
        assert_eq!(provider.get().unwrap().idle_timeout_ms, Some(1000));

        fs::write(&path, "idle_timeout_ms: 2000\n").unwrap();
        assert_eq!(provider.get().unwrap().idle_timeout_ms, Some(1000));
        assert_eq!(provider.reload().unwrap().idle_timeout_ms, Some(2000));
    }

    #[test]
    fn test_invalid_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "idle_timeout_ms: [not, a, number]\n").unwrap();

        let provider = FileConfigProvider::new(&path, ConfigLevel::User);
        assert!(matches!(provider.get(), Err(ConfigError::Yaml(_))));
    }
}
