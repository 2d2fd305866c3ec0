//! Configuration module for rdap-bootstrap
//!
//! This module provides configuration types and loading utilities.
//!
//! # Example
//!
//! ```no_run
//! use rdap_bootstrap::config::{load_config, Config};
//!
//! let config = load_config("/etc/rdap-bootstrap/config.json").unwrap();
//! println!("Bootstrap dir: {}", config.bootstrap.dir.display());
//! ```

mod loader;
mod types;

pub use loader::{
    apply_env_overrides, create_default_config, load_config, load_config_str,
    load_config_with_env, ENV_BOOTSTRAP_DIR, ENV_LOG_LEVEL, ENV_SYNC_INTERVAL,
};
pub use types::{BootstrapConfig, Config, LogConfig, MIN_SYNC_INTERVAL_SECS};
