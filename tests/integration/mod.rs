//! Integration tests for rdap-bootstrap
//!
//! # Test Organization
//!
//! - `sync_scenarios`: end-to-end sync then resolve scenarios per family
//! - `concurrency`: snapshot atomicity under concurrent readers and writers
//! - `file_sync`: bootstrap files on disk, config-driven sync passes and the
//!   periodic sync task

mod concurrency;
mod file_sync;
mod sync_scenarios;

use std::sync::Arc;

use rdap_bootstrap::bootstrap::{Family, RawDelegation, RedirectRegistry, Resolver, SyncCoordinator};

/// Registry, coordinator and resolver wired together
pub struct Harness {
    pub registry: Arc<RedirectRegistry>,
    pub sync: SyncCoordinator,
    pub resolver: Resolver,
}

impl Harness {
    pub fn new() -> Self {
        let registry = Arc::new(RedirectRegistry::new());
        Self {
            sync: SyncCoordinator::new(Arc::clone(&registry)),
            resolver: Resolver::new(Arc::clone(&registry)),
            registry,
        }
    }

    /// Sync `family` from `(key, urls)` pairs, panicking on rejection
    pub fn sync(&self, family: Family, entries: &[(&str, &[&str])]) -> u64 {
        self.sync
            .sync_family(family, &raw(family, entries))
            .expect("batch should be accepted")
    }
}

pub fn raw(family: Family, entries: &[(&str, &[&str])]) -> Vec<RawDelegation> {
    entries
        .iter()
        .map(|(key, urls)| RawDelegation::new(family, *key, urls.to_vec()))
        .collect()
}
