//! Configuration types for rdap-bootstrap

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bootstrap::{Family, ResolverOptions};
use crate::error::ConfigError;

/// Smallest accepted sync interval
pub const MIN_SYNC_INTERVAL_SECS: u64 = 60;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Bootstrap data sources and sync schedule
    #[serde(default)]
    pub bootstrap: BootstrapConfig,

    /// Resolver behavior
    #[serde(default)]
    pub resolver: ResolverOptions,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bootstrap.validate()?;
        self.log.validate()?;
        Ok(())
    }

    /// Create a default configuration
    #[must_use]
    pub fn default_config() -> Self {
        Self::default()
    }
}

/// Bootstrap file locations and sync interval
///
/// File names are relative to `dir` unless absolute. The default names are
/// the ones IANA publishes under `https://data.iana.org/rdap/`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BootstrapConfig {
    /// Directory holding the bootstrap files
    #[serde(default = "default_bootstrap_dir")]
    pub dir: PathBuf,

    /// IPv4 registry file
    #[serde(default = "default_ipv4_file")]
    pub ipv4_file: String,

    /// IPv6 registry file
    #[serde(default = "default_ipv6_file")]
    pub ipv6_file: String,

    /// Forward DNS registry file
    #[serde(default = "default_domain_file")]
    pub domain_file: String,

    /// AS number registry file
    #[serde(default = "default_asn_file")]
    pub asn_file: String,

    /// Object tag registry file
    #[serde(default = "default_entity_file")]
    pub entity_file: String,

    /// Seconds between periodic sync passes
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,
}

impl BootstrapConfig {
    /// Configured file name of a family
    #[must_use]
    pub fn file_name(&self, family: Family) -> &str {
        match family {
            Family::Ipv4 => &self.ipv4_file,
            Family::Ipv6 => &self.ipv6_file,
            Family::Domain => &self.domain_file,
            Family::Asn => &self.asn_file,
            Family::Entity => &self.entity_file,
        }
    }

    /// Full path of a family's bootstrap file
    #[must_use]
    pub fn file_for(&self, family: Family) -> PathBuf {
        self.dir.join(self.file_name(family))
    }

    /// Sync interval as a `Duration`
    #[must_use]
    pub const fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    /// Validate bootstrap configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` for an empty file name or a
    /// sync interval shorter than [`MIN_SYNC_INTERVAL_SECS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        for family in Family::ALL {
            if self.file_name(family).trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "bootstrap file name for {family} cannot be empty"
                )));
            }
        }

        if self.sync_interval_secs < MIN_SYNC_INTERVAL_SECS {
            return Err(ConfigError::ValidationError(format!(
                "sync_interval_secs must be at least {MIN_SYNC_INTERVAL_SECS}, got {}",
                self.sync_interval_secs
            )));
        }

        Ok(())
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            dir: default_bootstrap_dir(),
            ipv4_file: default_ipv4_file(),
            ipv6_file: default_ipv6_file(),
            domain_file: default_domain_file(),
            asn_file: default_asn_file(),
            entity_file: default_entity_file(),
            sync_interval_secs: default_sync_interval_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: "json" or "text"
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Include target (module path)
    #[serde(default)]
    pub target: bool,
}

impl LogConfig {
    /// Validate logging configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` for an unknown format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.format.as_str() {
            "json" | "text" => Ok(()),
            other => Err(ConfigError::ValidationError(format!(
                "log format must be 'json' or 'text', got '{other}'"
            ))),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            target: false,
        }
    }
}

fn default_bootstrap_dir() -> PathBuf {
    PathBuf::from("/etc/rdap-bootstrap")
}

fn default_ipv4_file() -> String {
    "ipv4.json".into()
}

fn default_ipv6_file() -> String {
    "ipv6.json".into()
}

fn default_domain_file() -> String {
    "dns.json".into()
}

fn default_asn_file() -> String {
    "asn.json".into()
}

fn default_entity_file() -> String {
    "object-tags.json".into()
}

const fn default_sync_interval_secs() -> u64 {
    86_400
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}
