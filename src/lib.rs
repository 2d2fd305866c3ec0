//! rdap-bootstrap: RDAP bootstrap redirect resolution
//!
//! This crate decides, for an RDAP query that the local registry is not
//! authoritative for, which remote RDAP service the client should be
//! redirected to. Delegations come from the IANA bootstrap registries
//! (RFC 7484 and RFC 8521).
//!
//! # Features
//!
//! - **Longest-prefix matching**: IPv4 and IPv6 binary radix tries
//! - **Suffix matching**: domain label tries and entity tag tries
//! - **AS range lookup**: binary search over disjoint ranges
//! - **Lock-free reads**: snapshots published through `ArcSwap`
//! - **All-or-nothing sync**: a bad batch never replaces a good snapshot
//!
//! # Architecture
//!
//! ```text
//! IANA bootstrap files → SyncCoordinator → RedirectRegistry ← Resolver ← request handler
//!                                              ↓
//!                                    per-family matcher snapshots
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use rdap_bootstrap::bootstrap::{RedirectQuery, RedirectRegistry, Resolver, SyncCoordinator};
//! use rdap_bootstrap::config::load_config;
//!
//! let config = load_config("/etc/rdap-bootstrap/config.json")?;
//!
//! let registry = Arc::new(RedirectRegistry::new());
//! let report = SyncCoordinator::new(Arc::clone(&registry)).sync_all(&config.bootstrap);
//! println!("{report}");
//!
//! let resolver = Resolver::with_options(registry, config.resolver);
//! if let Some(url) = resolver.redirect_location(&RedirectQuery::domain("example.com")) {
//!     println!("302 → {url}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Modules
//!
//! - [`bootstrap`]: Keys, matchers, registry, sync and resolver
//! - [`config`]: Configuration types and loading
//! - [`error`]: Error types

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod bootstrap;
pub mod config;
pub mod error;

// Re-export commonly used types at the crate root
pub use bootstrap::{
    DelegationRecord, Family, PrefixKey, RawDelegation, RedirectQuery, RedirectRegistry,
    RedirectTarget, Resolver, ResolverOptions, SyncCoordinator,
};
pub use config::{BootstrapConfig, Config};
pub use error::{BootstrapError, ConfigError, FeedError, KeyError, RecordError, SyncError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
