//! Batch validation
//!
//! Pure checks run over a whole family batch before any matcher is built.
//! Nothing here touches the registry, so a batch can be validated (and
//! rejected) without publishing anything.

use std::collections::HashSet;

use super::key::{Family, PrefixKey};
use super::record::{DelegationRecord, RawDelegation};
use crate::error::RecordError;

/// Validate a batch of records for one family
///
/// Checks that every record belongs to `family`, that no key appears twice,
/// and for the ASN family that no two ranges overlap. Nested IP networks and
/// nested domain suffixes are allowed; they are resolved by longest match.
///
/// # Errors
///
/// Returns the first `RecordError` found.
pub fn validate_batch(family: Family, records: &[DelegationRecord]) -> Result<(), RecordError> {
    for record in records {
        if record.family() != family {
            return Err(RecordError::FamilyMismatch {
                key: record.key().to_string(),
                expected: family,
                found: record.family(),
            });
        }
    }

    if family == Family::Asn {
        return check_asn_overlaps(records);
    }

    let mut seen: HashSet<&PrefixKey> = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.key()) {
            return Err(RecordError::DuplicateKey {
                family,
                key: record.key().to_string(),
            });
        }
    }
    Ok(())
}

fn check_asn_overlaps(records: &[DelegationRecord]) -> Result<(), RecordError> {
    let mut ranges: Vec<_> = records
        .iter()
        .filter_map(|r| match r.key() {
            PrefixKey::Asn(range) => Some(*range),
            _ => None,
        })
        .collect();
    ranges.sort_unstable();

    for pair in ranges.windows(2) {
        if pair[0] == pair[1] {
            return Err(RecordError::DuplicateKey {
                family: Family::Asn,
                key: pair[0].to_string(),
            });
        }
        if pair[0].overlaps(&pair[1]) {
            return Err(RecordError::OverlappingRange {
                first: pair[0].to_string(),
                second: pair[1].to_string(),
            });
        }
    }
    Ok(())
}

/// Normalize raw records and validate the resulting batch
///
/// # Errors
///
/// Returns `RecordError::FamilyMismatch` if a raw record is tagged with a
/// different family, the first normalization error, or the first batch
/// validation error.
pub fn prepare_batch(
    family: Family,
    raw: &[RawDelegation],
) -> Result<Vec<DelegationRecord>, RecordError> {
    let mut records = Vec::with_capacity(raw.len());
    for item in raw {
        if item.family != family {
            return Err(RecordError::FamilyMismatch {
                key: item.key.clone(),
                expected: family,
                found: item.family,
            });
        }
        records.push(DelegationRecord::from_raw(item)?);
    }
    validate_batch(family, &records)?;
    Ok(records)
}
