//! Common interface of the per-family matchers

use super::key::{Family, PrefixKey};
use super::record::DelegationRecord;
use crate::error::RecordError;

/// Read-only lookup index over the delegation records of one family
///
/// A matcher is built once from a validated batch and never mutated
/// afterwards. Replacing delegation data means building a new matcher.
pub trait Matcher: Send + Sync + Sized + 'static {
    /// Build a matcher from a batch of records
    ///
    /// # Errors
    ///
    /// Returns `RecordError` if a record does not belong to `family` or the
    /// batch contains a key conflict the matcher cannot represent.
    fn build(family: Family, records: Vec<DelegationRecord>) -> Result<Self, RecordError>;

    /// Matcher with no records
    fn empty(family: Family) -> Self;

    /// Return the most specific record matching `key`, if any
    ///
    /// Keys of a different family never match.
    fn lookup(&self, key: &PrefixKey) -> Option<&DelegationRecord>;

    /// Family served by this matcher
    fn family(&self) -> Family;

    /// All records, in build order
    fn records(&self) -> &[DelegationRecord];

    /// Number of records
    fn len(&self) -> usize {
        self.records().len()
    }

    /// Check if the matcher has no records
    fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

pub(crate) fn check_family(family: Family, record: &DelegationRecord) -> Result<(), RecordError> {
    if record.family() == family {
        Ok(())
    } else {
        Err(RecordError::FamilyMismatch {
            key: record.key().to_string(),
            expected: family,
            found: record.family(),
        })
    }
}
