//! Delegation records
//!
//! A [`RawDelegation`] is the unvalidated shape fed by a bootstrap source: a
//! key descriptor string plus target URL strings. A [`DelegationRecord`] is
//! the validated, immutable form stored inside a matcher snapshot.

use std::sync::Arc;

use super::key::{normalize, Family, PrefixKey};
use crate::error::RecordError;

/// Unvalidated delegation record as delivered by a bootstrap source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDelegation {
    /// Family the record belongs to
    pub family: Family,

    /// Network, range, domain suffix or tag descriptor (e.g. `1.0.0.0/24`)
    pub key: String,

    /// Target service URLs, most preferred first
    pub targets: Vec<String>,
}

impl RawDelegation {
    /// Create a new raw record
    #[must_use]
    pub fn new<I, S>(family: Family, key: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            family,
            key: key.into(),
            targets: targets.into_iter().map(Into::into).collect(),
        }
    }
}

/// Validated delegation record
///
/// Invariant: `targets` is never empty. Multiple targets are equally
/// authoritative mirrors; the first one is the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationRecord {
    key: PrefixKey,
    targets: Arc<[String]>,
}

impl DelegationRecord {
    /// Create a record from an already normalized key
    ///
    /// # Errors
    ///
    /// Returns `RecordError::EmptyTargets` if `targets` is empty.
    pub fn new(key: PrefixKey, targets: Vec<String>) -> Result<Self, RecordError> {
        if targets.is_empty() {
            return Err(RecordError::EmptyTargets {
                key: key.to_string(),
            });
        }
        Ok(Self {
            key,
            targets: targets.into(),
        })
    }

    /// Normalize and validate a raw record
    ///
    /// Targets are kept verbatim apart from surrounding whitespace; they are
    /// only parsed as URLs when a redirect location is built.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::InvalidKey` if the descriptor does not normalize,
    /// `RecordError::EmptyTargets` if there are no targets, and
    /// `RecordError::InvalidTarget` for a blank target.
    pub fn from_raw(raw: &RawDelegation) -> Result<Self, RecordError> {
        let key = normalize(raw.family, &raw.key)
            .map_err(|e| RecordError::invalid_key(raw.key.clone(), e))?;

        let targets = raw
            .targets
            .iter()
            .map(|target| {
                let trimmed = target.trim();
                if trimmed.is_empty() {
                    Err(RecordError::InvalidTarget {
                        key: key.to_string(),
                        url: target.clone(),
                        reason: "blank target".into(),
                    })
                } else {
                    Ok(trimmed.to_string())
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(key, targets)
    }

    /// The record's canonical key
    #[must_use]
    pub fn key(&self) -> &PrefixKey {
        &self.key
    }

    /// Family of the record
    #[must_use]
    pub fn family(&self) -> Family {
        self.key.family()
    }

    /// All target URLs, most preferred first
    #[must_use]
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Shared handle to the target list
    #[must_use]
    pub fn shared_targets(&self) -> Arc<[String]> {
        Arc::clone(&self.targets)
    }

    /// The default target (first URL)
    #[must_use]
    pub fn default_target(&self) -> &str {
        // Non-empty by construction
        &self.targets[0]
    }
}
