//! Service configuration
//!
//! Sources:
//! - `MemoryConfigProvider`: In-memory layer
//! - `FileConfigProvider`: YAML file-based (user/workspace level)
//! - Environment variables (`MODELRELAY_*`)
//!
//! `ConfigResolver` merges them into a `ServiceConfig`.

mod traits;
mod memory;
mod file;
mod settings;
mod resolver;

pub use traits::{ConfigProvider, ConfigError, ConfigResult};
pub use memory::MemoryConfigProvider;
pub use file::{FileConfigProvider, ConfigFile, ConfigLevel};
pub use settings::{
    ServiceConfig, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_IDLE_TIMEOUT_MS, DEFAULT_PROXY_BASE_URL,
};
pub use resolver::{env_layer, ConfigResolver, ENV_AUTH_TOKEN, ENV_IDLE_TIMEOUT_MS, ENV_PROXY_URL};
