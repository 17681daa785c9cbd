//! Core configuration structures for stark-declare

use serde::{Deserialize, Serialize};
use stark_declare_types::PollMode;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging and metrics
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-network settings by network name
    #[serde(default)]
    pub networks: HashMap<String, NetworkConfig>,

    /// Transaction status tracking
    #[serde(default)]
    pub tracking: TrackingConfig,

    /// Alias registry storage
    #[serde(default)]
    pub registry: RegistryConfig,

    /// External toolchain
    #[serde(default)]
    pub toolchain: ToolchainConfig,
}

impl AppConfig {
    /// Gateway configured for `network`, if any
    pub fn gateway_url(&self, network: &str) -> Option<&str> {
        self.networks
            .get(network)
            .and_then(|n| n.gateway_url.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,

    /// Count events and declarations in prometheus metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

/// Settings for one network
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Gateway URL; public networks do not need one
    #[serde(default)]
    pub gateway_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Seconds between status queries
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,

    /// Give up tracking after this many seconds; unbounded when unset
    #[serde(default)]
    pub deadline_secs: Option<u64>,

    /// Tracking applied to declarations that do not ask for a mode
    #[serde(default)]
    pub default_poll_mode: Option<PollMode>,

    /// Provisional aliases reconciled at once
    #[serde(default = "default_recovery_concurrency")]
    pub recovery_concurrency: usize,
}

impl TrackingConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

/// Alias storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryBackend {
    /// `<network>.declarations.txt` files
    File,
    Sqlite,
    /// Nothing persisted
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_backend")]
    pub backend: RegistryBackend,

    /// Directory holding declarations files (file backend)
    #[serde(default = "default_registry_directory")]
    pub directory: PathBuf,

    /// Database path (sqlite backend)
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolchainConfig {
    /// The `starknet` CLI
    #[serde(default = "default_starknet_bin")]
    pub starknet_bin: PathBuf,

    /// Compiled contract artifacts
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// Address → artifact mapping used to decode rejection messages
    #[serde(default)]
    pub contracts_file: Option<PathBuf>,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_retry_interval_secs() -> u64 {
    30
}

fn default_recovery_concurrency() -> usize {
    4
}

fn default_registry_backend() -> RegistryBackend {
    RegistryBackend::File
}

fn default_registry_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("aliases.db")
}

fn default_starknet_bin() -> PathBuf {
    PathBuf::from("starknet")
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
            metrics_enabled: default_true(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            retry_interval_secs: default_retry_interval_secs(),
            deadline_secs: None,
            default_poll_mode: None,
            recovery_concurrency: default_recovery_concurrency(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            backend: default_registry_backend(),
            directory: default_registry_directory(),
            sqlite_path: default_sqlite_path(),
        }
    }
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            starknet_bin: default_starknet_bin(),
            artifacts_dir: default_artifacts_dir(),
            contracts_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.logging.log_level, "info");
        assert!(config.logging.metrics_enabled);
        assert_eq!(config.tracking.retry_interval(), Duration::from_secs(30));
        assert!(config.tracking.deadline().is_none());
        assert_eq!(config.registry.backend, RegistryBackend::File);
        assert_eq!(config.toolchain.starknet_bin, PathBuf::from("starknet"));
    }

    #[test]
    fn test_gateway_lookup() {
        let mut config = AppConfig::default();
        config.networks.insert(
            "devnet".to_string(),
            NetworkConfig {
                gateway_url: Some("http://127.0.0.1:5050/".to_string()),
            },
        );
        config
            .networks
            .insert("goerli".to_string(), NetworkConfig::default());

        assert_eq!(config.gateway_url("devnet"), Some("http://127.0.0.1:5050/"));
        assert_eq!(config.gateway_url("goerli"), None);
        assert_eq!(config.gateway_url("mainnet"), None);
    }
}
