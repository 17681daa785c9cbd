//! Configuration for stark-declare
//!
//! [`AppConfig`] groups the logging, network, tracking, registry and
//! toolchain sections. [`ConfigLoader`] reads it from `.toml`, `.yaml`/`.yml`
//! or `.json` files and layers `STARK_DECLARE_*` environment variables on
//! top, e.g. `STARK_DECLARE_TRACKING__RETRY_INTERVAL_SECS=10`.
//! [`validate_config`] reports every invalid field in one error.

mod config;
mod loader;
mod validation;

pub use config::*;
pub use loader::*;
pub use validation::*;

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file extension names no supported format
    #[error("unsupported config format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("invalid configuration: {0}")]
    ValidationError(String),

    #[error("failed to read config: {0}")]
    IoError(#[from] std::io::Error),

    /// Raised while merging file, environment and override sources
    #[error("failed to layer config sources: {0}")]
    SourceError(#[from] ::config::ConfigError),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
