//! RDAP bootstrap redirect resolution
//!
//! This module answers one question for a registry-data query: if the
//! resource is not held locally, which RDAP service is authoritative for it?
//!
//! # Architecture
//!
//! ```text
//! queries:  Resolver ──► RedirectRegistry ──► per-family Matcher snapshot
//! updates:  SyncCoordinator ──► RedirectRegistry ──► new Matcher, atomic swap
//! ```
//!
//! - [`key`]: normalization of raw query text into [`PrefixKey`]s
//! - [`record`] / [`validate`]: delegation records and batch validation
//! - [`ip`], [`domain`], [`asn`], [`entity`]: one matcher per family
//! - [`registry`]: lock-free published snapshots, whole-family replace
//! - [`feed`] / [`sync`]: IANA bootstrap files and the sync coordinator
//! - [`resolver`]: the facade used by request handlers
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rdap_bootstrap::bootstrap::{
//!     Family, RawDelegation, RedirectQuery, RedirectRegistry, Resolver, SyncCoordinator,
//! };
//!
//! let registry = Arc::new(RedirectRegistry::new());
//! let sync = SyncCoordinator::new(Arc::clone(&registry));
//! sync.sync_family(
//!     Family::Ipv4,
//!     &[RawDelegation::new(Family::Ipv4, "1.0.0.0/24", ["http://new1", "http://new2"])],
//! )
//! .unwrap();
//!
//! let resolver = Resolver::new(registry);
//! let target = resolver.resolve(&RedirectQuery::ip("1.0.0.0/24", None)).unwrap();
//! assert_eq!(target.url, "http://new1");
//! assert!(resolver.resolve(&RedirectQuery::ip("2.0.0.0", None)).is_none());
//! ```

pub mod asn;
pub mod domain;
pub mod entity;
pub mod feed;
pub mod ip;
pub mod key;
pub mod matcher;
pub mod record;
pub mod registry;
pub mod resolver;
pub mod sync;
pub mod validate;

pub use feed::BootstrapFile;
pub use key::{Family, PrefixKey};
pub use matcher::Matcher;
pub use record::{DelegationRecord, RawDelegation};
pub use registry::{RedirectRegistry, RedirectTarget, RegistryStatsSnapshot, SnapshotInfo};
pub use resolver::{RedirectQuery, Resolver, ResolverOptions};
pub use sync::{spawn_periodic_sync, SyncCoordinator, SyncOutcome, SyncReport};
