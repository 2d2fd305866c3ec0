//! Sync coordinator
//!
//! Feeds bootstrap data into the registry, one family at a time. Each family
//! is loaded, validated and published independently: a broken `asn.json`
//! rejects only the ASN batch and leaves every other family (and the old ASN
//! snapshot) untouched.
//!
//! [`spawn_periodic_sync`] re-runs [`SyncCoordinator::sync_all`] on a fixed
//! interval until shutdown. Syncing does file I/O and rebuilds matchers, so
//! the periodic task runs it on the blocking pool.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::feed::BootstrapFile;
use super::key::Family;
use super::record::RawDelegation;
use super::registry::RedirectRegistry;
use crate::config::BootstrapConfig;
use crate::error::SyncError;

/// Result of syncing one family
#[derive(Debug)]
pub enum SyncOutcome {
    /// A new snapshot was published
    Published {
        /// Family synced
        family: Family,
        /// Version of the new snapshot
        version: u64,
    },

    /// The family has no configured source; its snapshot was left alone
    Skipped {
        /// Family skipped
        family: Family,
        /// Why it was skipped
        reason: String,
    },

    /// Loading or validation failed; the previous snapshot stays in effect
    Failed(SyncError),
}

impl SyncOutcome {
    /// Family this outcome refers to
    #[must_use]
    pub fn family(&self) -> Family {
        match self {
            Self::Published { family, .. } | Self::Skipped { family, .. } => *family,
            Self::Failed(e) => e.family(),
        }
    }
}

/// Per-family results of one full sync pass
#[derive(Debug, Default)]
pub struct SyncReport {
    outcomes: Vec<SyncOutcome>,
}

impl SyncReport {
    /// All outcomes, in family order
    #[must_use]
    pub fn outcomes(&self) -> &[SyncOutcome] {
        &self.outcomes
    }

    /// Outcome for one family
    #[must_use]
    pub fn outcome(&self, family: Family) -> Option<&SyncOutcome> {
        self.outcomes.iter().find(|o| o.family() == family)
    }

    /// Number of families that published a new snapshot
    #[must_use]
    pub fn published(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, SyncOutcome::Published { .. }))
            .count()
    }

    /// Number of skipped families
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, SyncOutcome::Skipped { .. }))
            .count()
    }

    /// Errors of the families that failed
    pub fn failures(&self) -> impl Iterator<Item = &SyncError> {
        self.outcomes.iter().filter_map(|o| match o {
            SyncOutcome::Failed(e) => Some(e),
            _ => None,
        })
    }

    /// Check that no family failed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} published, {} skipped, {} failed",
            self.published(),
            self.skipped(),
            self.failures().count()
        )
    }
}

/// Single writer in front of the registry
///
/// Individual family replaces are already serialized by the registry;
/// the coordinator additionally keeps full sync passes from interleaving.
pub struct SyncCoordinator {
    registry: Arc<RedirectRegistry>,
    run_lock: Mutex<()>,
}

impl SyncCoordinator {
    /// Create a coordinator writing into `registry`
    #[must_use]
    pub fn new(registry: Arc<RedirectRegistry>) -> Self {
        Self {
            registry,
            run_lock: Mutex::new(()),
        }
    }

    /// The registry being fed
    #[must_use]
    pub fn registry(&self) -> &Arc<RedirectRegistry> {
        &self.registry
    }

    /// Replace one family from a raw batch
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Rejected` if the batch fails validation; the
    /// previous snapshot stays published.
    pub fn sync_family(&self, family: Family, raw: &[RawDelegation]) -> Result<u64, SyncError> {
        self.registry
            .replace_family_raw(family, raw, None)
            .map_err(|source| SyncError::Rejected { family, source })
    }

    /// Replace one family from a parsed bootstrap file
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Feed` for malformed service entries and
    /// `SyncError::Rejected` if the records fail validation.
    pub fn sync_bootstrap(&self, family: Family, file: &BootstrapFile) -> Result<u64, SyncError> {
        let raw = file
            .to_raw(family)
            .map_err(|source| SyncError::Feed { family, source })?;
        self.registry
            .replace_family_raw(family, &raw, file.publication.clone())
            .map_err(|source| SyncError::Rejected { family, source })
    }

    /// Replace one family from a bootstrap file on disk
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Feed` if the file cannot be read or parsed, and
    /// `SyncError::Rejected` if its records fail validation.
    pub fn sync_from_file(&self, family: Family, path: impl AsRef<Path>) -> Result<u64, SyncError> {
        let file = BootstrapFile::load(path).map_err(|source| SyncError::Feed { family, source })?;
        self.sync_bootstrap(family, &file)
    }

    /// Sync every family from its configured file
    ///
    /// Families whose file does not exist are skipped. Failures are reported
    /// per family and do not stop the pass.
    pub fn sync_all(&self, config: &BootstrapConfig) -> SyncReport {
        let _run = self.run_lock.lock();
        let mut report = SyncReport::default();

        for family in Family::ALL {
            let path = config.file_for(family);
            if !path.exists() {
                warn!(family = %family, path = %path.display(), "Bootstrap file not found, skipping");
                report.outcomes.push(SyncOutcome::Skipped {
                    family,
                    reason: format!("{} not found", path.display()),
                });
                continue;
            }

            let outcome = match self.sync_from_file(family, &path) {
                Ok(version) => SyncOutcome::Published { family, version },
                Err(e) => {
                    if e.is_recoverable() {
                        warn!(error = %e, "Bootstrap sync failed, will retry");
                    } else {
                        error!(error = %e, "Bootstrap sync failed");
                    }
                    SyncOutcome::Failed(e)
                }
            };
            report.outcomes.push(outcome);
        }

        info!(report = %report, "Bootstrap sync pass finished");
        report
    }
}

impl fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Run `sync_all` every `interval` until `shutdown` fires
///
/// The first pass happens one interval after spawning; callers are expected
/// to run an initial sync themselves during startup.
pub fn spawn_periodic_sync(
    coordinator: Arc<SyncCoordinator>,
    config: BootstrapConfig,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    let config = Arc::new(config);
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);

        // Skip the first immediate tick
        timer.tick().await;

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    let coordinator = Arc::clone(&coordinator);
                    let config = Arc::clone(&config);
                    match tokio::task::spawn_blocking(move || coordinator.sync_all(&config)).await {
                        Ok(report) => debug!(report = %report, "Periodic bootstrap sync completed"),
                        Err(e) => error!(error = %e, "Periodic bootstrap sync task panicked"),
                    }
                }

                _ = shutdown.recv() => {
                    info!("Periodic bootstrap sync shutdown signal received");
                    return;
                }
            }
        }
    })
}
