//! Redirect registry
//!
//! The registry owns one published matcher snapshot per family. Readers load
//! the current snapshot through an `ArcSwap` and never take a lock; writers
//! build a complete new matcher off to the side and publish it with a single
//! pointer swap.
//!
//! # Snapshot Semantics
//!
//! - `resolve` sees exactly one snapshot per call, either the one before or
//!   the one after a concurrent replace, never a mixture
//! - `replace_family` is all-or-nothing: a rejected batch leaves the
//!   previous snapshot published and untouched
//! - Replacement is whole-family. Records absent from the new batch are gone
//!   after the swap, even if they were not "touched"
//!
//! # Lock Ordering
//!
//! Each family has its own writer mutex. Writers for different families
//! never contend, and no code path holds two writer mutexes at once.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use super::asn::AsnMatcher;
use super::domain::DomainMatcher;
use super::entity::EntityMatcher;
use super::ip::IpPrefixMatcher;
use super::key::{Family, PrefixKey};
use super::matcher::Matcher;
use super::record::{DelegationRecord, RawDelegation};
use super::resolver::RedirectQuery;
use super::validate::{prepare_batch, validate_batch};
use crate::error::RecordError;

// ============================================================================
// Redirect Target
// ============================================================================

/// Result of a successful resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    /// Base URL of the authoritative service, exactly as delegated
    pub url: String,

    /// Key of the delegation that matched
    pub matched_key: PrefixKey,

    /// All equally authoritative service URLs, default first
    pub mirrors: Arc<[String]>,
}

impl RedirectTarget {
    fn from_record(record: &DelegationRecord) -> Self {
        Self {
            url: record.default_target().to_string(),
            matched_key: record.key().clone(),
            mirrors: record.shared_targets(),
        }
    }

    /// Switch to the first `https` mirror, if there is one
    #[must_use]
    pub fn prefer_https(mut self) -> Self {
        if let Some(secure) = self.mirrors.iter().find(|u| is_https(u)) {
            self.url = secure.clone();
        }
        self
    }

    /// Full RDAP URL the client should be redirected to for `query`
    ///
    /// The query path (`ip/…`, `domain/…`, `autnum/…`, `entity/…`) is
    /// appended below the base URL's path.
    ///
    /// # Errors
    ///
    /// Returns `url::ParseError` if the base is not an absolute URL or cannot
    /// carry a path (e.g. `mailto:` URLs).
    ///
    /// # Example
    ///
    /// ```
    /// use rdap_bootstrap::bootstrap::{RedirectQuery, RedirectRegistry, RawDelegation, Family};
    /// use rdap_bootstrap::bootstrap::validate::prepare_batch;
    ///
    /// let registry = RedirectRegistry::new();
    /// let raw = [RawDelegation::new(Family::Domain, "cn", ["http://cnnic.cn/rdap"])];
    /// registry
    ///     .replace_family(Family::Domain, prepare_batch(Family::Domain, &raw).unwrap())
    ///     .unwrap();
    ///
    /// let query = RedirectQuery::domain("baidu.cn");
    /// let target = registry.resolve(&query.normalize().unwrap()).unwrap();
    /// assert_eq!(
    ///     target.location(&query).unwrap().as_str(),
    ///     "http://cnnic.cn/rdap/domain/baidu.cn"
    /// );
    /// ```
    pub fn location(&self, query: &RedirectQuery) -> Result<Url, url::ParseError> {
        let mut location = Url::parse(&self.url)?;
        {
            let mut segments = location
                .path_segments_mut()
                .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?;
            segments.pop_if_empty();
            segments.extend(query.rdap_segments());
        }
        Ok(location)
    }
}

fn is_https(url: &str) -> bool {
    url.get(..6).is_some_and(|scheme| scheme.eq_ignore_ascii_case("https:"))
}

impl fmt::Display for RedirectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (matched {})", self.url, self.matched_key)
    }
}

// ============================================================================
// Statistics
// ============================================================================

#[derive(Default)]
struct FamilyCounters {
    lookups: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    replaces: AtomicU64,
    rejected: AtomicU64,
}

impl FamilyCounters {
    fn snapshot(&self, family: Family) -> FamilyStatsSnapshot {
        FamilyStatsSnapshot {
            family,
            lookups: self.lookups.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            replaces: self.replaces.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

/// Per-family registry counters
///
/// Updated with relaxed atomics on the query path; values are diagnostic
/// and may be momentarily inconsistent with each other.
#[derive(Default)]
pub struct RegistryStats {
    families: [FamilyCounters; 5],
}

impl RegistryStats {
    fn counters(&self, family: Family) -> &FamilyCounters {
        &self.families[family.index()]
    }

    fn record_lookup(&self, family: Family, hit: bool) {
        let counters = self.counters(family);
        counters.lookups.fetch_add(1, Ordering::Relaxed);
        if hit {
            counters.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            counters.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_replace(&self, family: Family) {
        self.counters(family).replaces.fetch_add(1, Ordering::Relaxed);
    }

    fn record_rejected(&self, family: Family) {
        self.counters(family).rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of the statistics
    #[must_use]
    pub fn snapshot(&self) -> RegistryStatsSnapshot {
        RegistryStatsSnapshot {
            families: Family::ALL.map(|family| self.counters(family).snapshot(family)),
        }
    }
}

impl fmt::Debug for RegistryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryStats")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

/// Point-in-time counters of one family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyStatsSnapshot {
    /// Family the counters belong to
    pub family: Family,

    /// Number of `resolve` calls
    pub lookups: u64,

    /// Lookups that found a delegation
    pub hits: u64,

    /// Lookups that found nothing
    pub misses: u64,

    /// Successfully published snapshots
    pub replaces: u64,

    /// Batches rejected by validation
    pub rejected: u64,
}

/// Point-in-time capture of all registry counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStatsSnapshot {
    families: [FamilyStatsSnapshot; 5],
}

impl RegistryStatsSnapshot {
    /// Counters for one family
    #[must_use]
    pub fn family(&self, family: Family) -> &FamilyStatsSnapshot {
        &self.families[family.index()]
    }

    /// Counters for all families, in `Family::ALL` order
    #[must_use]
    pub fn families(&self) -> &[FamilyStatsSnapshot] {
        &self.families
    }

    /// Total lookups across families
    #[must_use]
    pub fn total_lookups(&self) -> u64 {
        self.families.iter().map(|f| f.lookups).sum()
    }
}

// ============================================================================
// Family Snapshots
// ============================================================================

/// One published, immutable matcher plus its metadata
struct FamilySnapshot<M> {
    matcher: M,
    version: u64,
    publication: Option<String>,
    published_at: Option<u64>,
}

/// Metadata of the currently published snapshot of a family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotInfo {
    /// Family described
    pub family: Family,

    /// Snapshot version; 0 is the initial empty snapshot
    pub version: u64,

    /// Number of delegation records
    pub records: usize,

    /// Publication timestamp reported by the bootstrap source
    pub publication: Option<String>,

    /// Unix timestamp of the swap (None for the initial empty snapshot)
    pub published_at: Option<u64>,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Published snapshot of one family plus its writer lock
struct FamilySlot<M> {
    family: Family,
    current: ArcSwap<FamilySnapshot<M>>,
    writer: Mutex<()>,
}

impl<M: Matcher> FamilySlot<M> {
    fn new(family: Family) -> Self {
        Self {
            family,
            current: ArcSwap::from_pointee(FamilySnapshot {
                matcher: M::empty(family),
                version: 0,
                publication: None,
                published_at: None,
            }),
            writer: Mutex::new(()),
        }
    }
}

/// Type-erased access to a family slot
trait Slot: Send + Sync {
    fn lookup(&self, key: &PrefixKey) -> Option<RedirectTarget>;

    fn replace(
        &self,
        records: Vec<DelegationRecord>,
        publication: Option<String>,
    ) -> Result<u64, RecordError>;

    fn info(&self) -> SnapshotInfo;

    fn records(&self) -> Vec<DelegationRecord>;
}

impl<M: Matcher> Slot for FamilySlot<M> {
    fn lookup(&self, key: &PrefixKey) -> Option<RedirectTarget> {
        let snapshot = self.current.load();
        snapshot.matcher.lookup(key).map(RedirectTarget::from_record)
    }

    fn replace(
        &self,
        records: Vec<DelegationRecord>,
        publication: Option<String>,
    ) -> Result<u64, RecordError> {
        let _writer = self.writer.lock();

        validate_batch(self.family, &records)?;
        let matcher = M::build(self.family, records)?;

        let version = self.current.load().version + 1;
        self.current.store(Arc::new(FamilySnapshot {
            matcher,
            version,
            publication,
            published_at: Some(unix_now()),
        }));
        Ok(version)
    }

    fn info(&self) -> SnapshotInfo {
        let snapshot = self.current.load();
        SnapshotInfo {
            family: self.family,
            version: snapshot.version,
            records: snapshot.matcher.len(),
            publication: snapshot.publication.clone(),
            published_at: snapshot.published_at,
        }
    }

    fn records(&self) -> Vec<DelegationRecord> {
        self.current.load().matcher.records().to_vec()
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Holder of the published delegation snapshots of every family
///
/// # Thread Safety
///
/// - `resolve` is lock-free and wait-free (one `ArcSwap` load)
/// - `replace_family` serializes writers of the same family
/// - Statistics use atomic counters
///
/// # Example
///
/// ```
/// use rdap_bootstrap::bootstrap::{Family, RawDelegation, RedirectRegistry};
/// use rdap_bootstrap::bootstrap::key::normalize_ip;
/// use rdap_bootstrap::bootstrap::validate::prepare_batch;
///
/// let registry = RedirectRegistry::new();
/// let raw = [RawDelegation::new(Family::Ipv4, "1.0.0.0/0", ["http://cnnic.cn/rdap"])];
/// registry
///     .replace_family(Family::Ipv4, prepare_batch(Family::Ipv4, &raw).unwrap())
///     .unwrap();
///
/// let target = registry.resolve(&normalize_ip("1.0.0.0", Some(0)).unwrap()).unwrap();
/// assert_eq!(target.url.as_str(), "http://cnnic.cn/rdap");
/// ```
pub struct RedirectRegistry {
    ipv4: FamilySlot<IpPrefixMatcher>,
    ipv6: FamilySlot<IpPrefixMatcher>,
    domain: FamilySlot<DomainMatcher>,
    asn: FamilySlot<AsnMatcher>,
    entity: FamilySlot<EntityMatcher>,
    stats: RegistryStats,
}

impl RedirectRegistry {
    /// Create a registry with an empty snapshot for every family
    #[must_use]
    pub fn new() -> Self {
        Self {
            ipv4: FamilySlot::new(Family::Ipv4),
            ipv6: FamilySlot::new(Family::Ipv6),
            domain: FamilySlot::new(Family::Domain),
            asn: FamilySlot::new(Family::Asn),
            entity: FamilySlot::new(Family::Entity),
            stats: RegistryStats::default(),
        }
    }

    fn slot(&self, family: Family) -> &dyn Slot {
        match family {
            Family::Ipv4 => &self.ipv4,
            Family::Ipv6 => &self.ipv6,
            Family::Domain => &self.domain,
            Family::Asn => &self.asn,
            Family::Entity => &self.entity,
        }
    }

    /// Resolve a normalized key against its family's current snapshot
    ///
    /// Returns `None` when no delegation matches, meaning the resource is
    /// served locally.
    #[must_use]
    pub fn resolve(&self, key: &PrefixKey) -> Option<RedirectTarget> {
        let family = key.family();
        let target = self.slot(family).lookup(key);
        self.stats.record_lookup(family, target.is_some());
        target
    }

    /// Atomically replace every delegation of `family`
    ///
    /// Returns the version of the newly published snapshot.
    ///
    /// # Errors
    ///
    /// Returns the first `RecordError` found in the batch. The previous
    /// snapshot stays published.
    pub fn replace_family(
        &self,
        family: Family,
        records: Vec<DelegationRecord>,
    ) -> Result<u64, RecordError> {
        self.replace_family_published(family, records, None)
    }

    /// Like [`replace_family`](Self::replace_family), also recording the
    /// source's publication timestamp
    ///
    /// # Errors
    ///
    /// Returns the first `RecordError` found in the batch.
    pub fn replace_family_published(
        &self,
        family: Family,
        records: Vec<DelegationRecord>,
        publication: Option<String>,
    ) -> Result<u64, RecordError> {
        let count = records.len();
        let result = self.slot(family).replace(records, publication);
        self.finish_replace(family, count, result)
    }

    /// Normalize, validate and publish a raw batch in one step
    ///
    /// # Errors
    ///
    /// Returns the first normalization or validation `RecordError`. The
    /// previous snapshot stays published.
    pub fn replace_family_raw(
        &self,
        family: Family,
        raw: &[RawDelegation],
        publication: Option<String>,
    ) -> Result<u64, RecordError> {
        let result = prepare_batch(family, raw)
            .and_then(|records| self.slot(family).replace(records, publication));
        self.finish_replace(family, raw.len(), result)
    }

    fn finish_replace(
        &self,
        family: Family,
        count: usize,
        result: Result<u64, RecordError>,
    ) -> Result<u64, RecordError> {
        match &result {
            Ok(version) => {
                self.stats.record_replace(family);
                info!(family = %family, records = count, version, "Published delegation snapshot");
            }
            Err(e) => {
                self.stats.record_rejected(family);
                warn!(family = %family, records = count, error = %e, "Rejected delegation batch");
            }
        }
        result
    }

    /// Drop every delegation of `family`
    ///
    /// Publishes an empty snapshot and returns its version.
    ///
    /// # Errors
    ///
    /// Returns the `RecordError` of the underlying replace.
    pub fn clear_family(&self, family: Family) -> Result<u64, RecordError> {
        debug!(family = %family, "Clearing delegations");
        self.replace_family(family, Vec::new())
    }

    /// Metadata of the current snapshot of `family`
    #[must_use]
    pub fn snapshot_info(&self, family: Family) -> SnapshotInfo {
        self.slot(family).info()
    }

    /// Copy of the current records of `family`
    #[must_use]
    pub fn records(&self, family: Family) -> Vec<DelegationRecord> {
        self.slot(family).records()
    }

    /// Total number of records across all families
    #[must_use]
    pub fn total_records(&self) -> usize {
        Family::ALL
            .iter()
            .map(|f| self.slot(*f).info().records)
            .sum()
    }

    /// Registry statistics
    #[must_use]
    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }
}

impl Default for RedirectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RedirectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("RedirectRegistry");
        for family in Family::ALL {
            let info = self.snapshot_info(family);
            s.field(family.as_str(), &format_args!("v{} ({} records)", info.version, info.records));
        }
        s.finish()
    }
}
