//! Configuration validation

use crate::{AppConfig, ConfigError, RegistryBackend, Result};

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the entire application configuration.
///
/// Every problem is reported, joined by `; `, in a single
/// [`ConfigError::ValidationError`].
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    // Logging
    if let Err(e) = validate_log_level(&config.logging.log_level) {
        errors.push(e);
    }

    // Networks
    let mut names: Vec<_> = config.networks.keys().collect();
    names.sort();
    for name in names {
        if let Err(e) = validate_network_name(name) {
            errors.push(ValidationError::new(format!("networks.{name}"), e));
        }

        if let Some(url) = config.gateway_url(name) {
            if let Err(e) = validate_url(url) {
                errors.push(ValidationError::new(
                    format!("networks.{name}.gateway_url"),
                    e,
                ));
            }
        }
    }

    // Tracking
    if config.tracking.retry_interval_secs == 0 {
        errors.push(ValidationError::new(
            "tracking.retry_interval_secs",
            "must be greater than 0",
        ));
    }

    if config.tracking.deadline_secs == Some(0) {
        errors.push(ValidationError::new(
            "tracking.deadline_secs",
            "must be greater than 0 when set",
        ));
    }

    if config.tracking.recovery_concurrency == 0 {
        errors.push(ValidationError::new(
            "tracking.recovery_concurrency",
            "must be greater than 0",
        ));
    }

    // Registry
    match config.registry.backend {
        RegistryBackend::File if config.registry.directory.as_os_str().is_empty() => {
            errors.push(ValidationError::new(
                "registry.directory",
                "directory is required for the file backend",
            ));
        }
        RegistryBackend::Sqlite if config.registry.sqlite_path.as_os_str().is_empty() => {
            errors.push(ValidationError::new(
                "registry.sqlite_path",
                "database path is required for the sqlite backend",
            ));
        }
        _ => {}
    }

    // Toolchain
    if config.toolchain.starknet_bin.as_os_str().is_empty() {
        errors.push(ValidationError::new(
            "toolchain.starknet_bin",
            "toolchain binary is required",
        ));
    }

    // Return all errors if any were found
    if !errors.is_empty() {
        let error_msg = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ConfigError::ValidationError(error_msg));
    }

    Ok(())
}

/// Network names end up in file names and in the alias file format
pub fn validate_network_name(name: &str) -> std::result::Result<(), String> {
    if name.trim().is_empty() {
        return Err("network name is required".to_string());
    }

    if let Some(c) = name.chars().find(|c| matches!(c, '/' | '\\' | ':')) {
        return Err(format!("network name must not contain '{c}'"));
    }

    Ok(())
}

/// Validate URL format
pub fn validate_url(url: &str) -> std::result::Result<(), String> {
    if url.is_empty() {
        return Err("URL cannot be empty".to_string());
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(format!("URL must start with http:// or https://: {url}"));
    }

    Ok(())
}

/// Validate log level
pub fn validate_log_level(level: &str) -> std::result::Result<(), ValidationError> {
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new(
            "logging.log_level",
            format!("invalid log level '{level}', must be one of: trace, debug, info, warn, error"),
        )),
    }
}
