//! AS number range matcher
//!
//! Delegated ranges are kept sorted by their low end. Because ranges in one
//! snapshot never overlap, the only candidate for a query is the last range
//! starting at or below the query's low end, found by binary search.

use super::key::{AsnRange, Family, PrefixKey};
use super::matcher::{check_family, Matcher};
use super::record::DelegationRecord;
use crate::error::RecordError;

/// Sorted, disjoint AS range index
#[derive(Debug)]
pub struct AsnMatcher {
    /// (range, index into `records`), sorted by range
    ranges: Vec<(AsnRange, usize)>,
    records: Vec<DelegationRecord>,
}

impl Matcher for AsnMatcher {
    fn build(family: Family, records: Vec<DelegationRecord>) -> Result<Self, RecordError> {
        let mut ranges = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            check_family(family, record)?;
            if let PrefixKey::Asn(range) = record.key() {
                ranges.push((*range, i));
            }
        }
        ranges.sort_unstable();

        for pair in ranges.windows(2) {
            let (first, second) = (pair[0].0, pair[1].0);
            if first.overlaps(&second) {
                return Err(if first == second {
                    RecordError::DuplicateKey {
                        family: Family::Asn,
                        key: first.to_string(),
                    }
                } else {
                    RecordError::OverlappingRange {
                        first: first.to_string(),
                        second: second.to_string(),
                    }
                });
            }
        }

        Ok(Self { ranges, records })
    }

    fn empty(_family: Family) -> Self {
        Self {
            ranges: Vec::new(),
            records: Vec::new(),
        }
    }

    fn lookup(&self, key: &PrefixKey) -> Option<&DelegationRecord> {
        let PrefixKey::Asn(query) = key else {
            return None;
        };

        let idx = self
            .ranges
            .partition_point(|(range, _)| range.low() <= query.low());
        let (range, record) = self.ranges.get(idx.checked_sub(1)?)?;
        range.contains(query).then(|| &self.records[*record])
    }

    fn family(&self) -> Family {
        Family::Asn
    }

    fn records(&self) -> &[DelegationRecord] {
        &self.records
    }
}
