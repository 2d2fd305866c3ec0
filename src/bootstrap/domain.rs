//! Domain suffix matcher
//!
//! Delegations are stored in a label trie rooted at the DNS root. A lookup
//! walks the query labels from the top-level domain inward and keeps the
//! deepest node that carries a record, so `example.com` beats `com`.
//!
//! Matching is on whole labels: a record for `example.com` never matches
//! `notexample.com`.

use std::collections::HashMap;

use super::key::{Family, PrefixKey};
use super::matcher::{check_family, Matcher};
use super::record::DelegationRecord;
use crate::error::RecordError;

#[derive(Debug, Default)]
struct LabelNode {
    children: HashMap<Box<str>, usize>,
    record: Option<usize>,
}

/// Label trie over domain delegations
#[derive(Debug)]
pub struct DomainMatcher {
    nodes: Vec<LabelNode>,
    records: Vec<DelegationRecord>,
}

impl DomainMatcher {
    fn insert(&mut self, record: DelegationRecord) -> Result<(), RecordError> {
        let PrefixKey::Domain(domain) = record.key() else {
            return Err(RecordError::FamilyMismatch {
                key: record.key().to_string(),
                expected: Family::Domain,
                found: record.family(),
            });
        };

        let mut node = 0;
        for label in domain.labels() {
            node = if let Some(&next) = self.nodes[node].children.get(label.as_str()) {
                next
            } else {
                let next = self.nodes.len();
                self.nodes.push(LabelNode::default());
                self.nodes[node].children.insert(label.as_str().into(), next);
                next
            };
        }

        if self.nodes[node].record.is_some() {
            return Err(RecordError::DuplicateKey {
                family: Family::Domain,
                key: record.key().to_string(),
            });
        }
        self.nodes[node].record = Some(self.records.len());
        self.records.push(record);
        Ok(())
    }
}

impl Matcher for DomainMatcher {
    fn build(family: Family, records: Vec<DelegationRecord>) -> Result<Self, RecordError> {
        let mut matcher = Self::empty(family);
        matcher.records.reserve(records.len());
        for record in records {
            check_family(family, &record)?;
            matcher.insert(record)?;
        }
        Ok(matcher)
    }

    fn empty(_family: Family) -> Self {
        Self {
            nodes: vec![LabelNode::default()],
            records: Vec::new(),
        }
    }

    fn lookup(&self, key: &PrefixKey) -> Option<&DelegationRecord> {
        let PrefixKey::Domain(domain) = key else {
            return None;
        };

        let mut node = 0;
        let mut best = None;
        for label in domain.labels() {
            let Some(&next) = self.nodes[node].children.get(label.as_str()) else {
                break;
            };
            node = next;
            if let Some(record) = self.nodes[node].record {
                best = Some(record);
            }
        }

        best.map(|i| &self.records[i])
    }

    fn family(&self) -> Family {
        Family::Domain
    }

    fn records(&self) -> &[DelegationRecord] {
        &self.records
    }
}
