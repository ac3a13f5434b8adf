//! # Gateway Config
//!
//! Layered configuration for the LLM Inference Gateway: built-in
//! defaults, an optional TOML/YAML file (`GATEWAY_CONFIG_PATH`), and
//! environment variable overrides, with optional hot reload of the file
//! layer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod settings;
pub mod watch;

pub use error::ConfigError;
pub use loader::load_config;
pub use settings::{
    AdminSettings, BudgetDefaults, CacheSettings, DatabaseSettings, GatewayConfig, ProviderConfig,
    ServerConfig,
};
pub use watch::{spawn_watcher, ConfigHandle};
