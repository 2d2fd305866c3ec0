//! Configuration loading and management
//!
//! This module handles loading configuration from files and environment variables.

use std::path::Path;

use tracing::{debug, info};

use super::types::Config;
use crate::error::ConfigError;

/// Environment variable overriding `bootstrap.dir`
pub const ENV_BOOTSTRAP_DIR: &str = "RDAP_BOOTSTRAP_DIR";

/// Environment variable overriding `log.level`
pub const ENV_LOG_LEVEL: &str = "RDAP_BOOTSTRAP_LOG_LEVEL";

/// Environment variable overriding `bootstrap.sync_interval_secs`
pub const ENV_SYNC_INTERVAL: &str = "RDAP_BOOTSTRAP_SYNC_INTERVAL";

/// Load configuration from a JSON file
///
/// # Arguments
///
/// * `path` - Path to the configuration file
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();

    debug!("Loading configuration from {:?}", path);

    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let contents = std::fs::read_to_string(path)?;

    let config: Config = serde_json::from_str(&contents).map_err(|e| {
        ConfigError::ParseError(format!("Failed to parse JSON: {e} at {path:?}"))
    })?;

    config.validate()?;

    info!(
        "Configuration loaded: bootstrap dir={}, sync every {}s",
        config.bootstrap.dir.display(),
        config.bootstrap.sync_interval_secs
    );

    Ok(config)
}

/// Load configuration from a JSON string
///
/// # Errors
///
/// Returns `ConfigError` if parsing or validation fails.
pub fn load_config_str(json: &str) -> Result<Config, ConfigError> {
    let config: Config =
        serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    config.validate()?;

    Ok(config)
}

/// Load configuration with environment variable overrides
///
/// Environment variables:
/// - `RDAP_BOOTSTRAP_DIR`: Override the bootstrap file directory
/// - `RDAP_BOOTSTRAP_LOG_LEVEL`: Override log level
/// - `RDAP_BOOTSTRAP_SYNC_INTERVAL`: Override sync interval (seconds)
///
/// # Errors
///
/// Returns `ConfigError` if loading or parsing fails.
pub fn load_config_with_env(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let mut config = load_config(path)?;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    Ok(config)
}

/// Apply overrides from a variable lookup and re-validate
///
/// # Errors
///
/// Returns `ConfigError::EnvError` for an unparsable value and
/// `ConfigError::ValidationError` if the result no longer validates.
pub fn apply_env_overrides(
    config: &mut Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(dir) = lookup(ENV_BOOTSTRAP_DIR) {
        config.bootstrap.dir = dir.into();
        debug!("Bootstrap dir overridden to {:?}", config.bootstrap.dir);
    }

    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        config.log.level = level;
        debug!("Log level overridden to {}", config.log.level);
    }

    if let Some(interval) = lookup(ENV_SYNC_INTERVAL) {
        config.bootstrap.sync_interval_secs =
            interval.trim().parse().map_err(|_| ConfigError::EnvError {
                name: ENV_SYNC_INTERVAL.into(),
                reason: format!("Invalid number: {interval}"),
            })?;
        debug!(
            "Sync interval overridden to {}s",
            config.bootstrap.sync_interval_secs
        );
    }

    // Re-validate after overrides
    config.validate()
}

/// Create a default configuration file at the given path
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be written.
pub fn create_default_config(path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let config = Config::default_config();
    let json = serde_json::to_string_pretty(&config)
        .map_err(|e| ConfigError::ParseError(format!("Failed to serialize config: {e}")))?;

    std::fs::write(path, json)?;
    Ok(())
}
