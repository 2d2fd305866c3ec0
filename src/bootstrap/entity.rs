//! Entity tag matcher
//!
//! Entity handles carry their registry tag as a suffix (`ABC123-ARIN`).
//! Tags are stored in a trie over their characters in reverse order; a
//! lookup walks the handle from its last character and keeps the longest tag
//! that either covers the whole handle or ends at a `-` separator.
//!
//! This is narrower than a plain string suffix: `AP` matches `IRT-APNIC-AP`
//! and `AP` itself, but not `MAP` or `IRT-MAP`. RFC 8521 handles always put
//! the tag after a `-`, and a bare suffix would let short tags claim
//! unrelated handles.

use std::collections::HashMap;

use super::key::{Family, PrefixKey};
use super::matcher::{check_family, Matcher};
use super::record::DelegationRecord;
use crate::error::RecordError;

/// Separator between an entity handle and its tag
pub const TAG_SEPARATOR: char = '-';

#[derive(Debug, Default)]
struct CharNode {
    children: HashMap<char, usize>,
    record: Option<usize>,
}

/// Reversed-character trie over entity tag delegations
#[derive(Debug)]
pub struct EntityMatcher {
    nodes: Vec<CharNode>,
    records: Vec<DelegationRecord>,
}

impl EntityMatcher {
    fn insert(&mut self, record: DelegationRecord) -> Result<(), RecordError> {
        let PrefixKey::Entity(tag) = record.key() else {
            return Err(RecordError::FamilyMismatch {
                key: record.key().to_string(),
                expected: Family::Entity,
                found: record.family(),
            });
        };

        let mut node = 0;
        for c in tag.as_str().chars().rev() {
            node = if let Some(&next) = self.nodes[node].children.get(&c) {
                next
            } else {
                let next = self.nodes.len();
                self.nodes.push(CharNode::default());
                self.nodes[node].children.insert(c, next);
                next
            };
        }

        if self.nodes[node].record.is_some() {
            return Err(RecordError::DuplicateKey {
                family: Family::Entity,
                key: record.key().to_string(),
            });
        }
        self.nodes[node].record = Some(self.records.len());
        self.records.push(record);
        Ok(())
    }
}

impl Matcher for EntityMatcher {
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
            nodes: vec![CharNode::default()],
            records: Vec::new(),
        }
    }

    fn lookup(&self, key: &PrefixKey) -> Option<&DelegationRecord> {
        let PrefixKey::Entity(handle) = key else {
            return None;
        };

        let mut chars = handle.as_str().chars().rev().peekable();
        let mut node = 0;
        let mut best = None;
        while let Some(c) = chars.next() {
            let Some(&next) = self.nodes[node].children.get(&c) else {
                break;
            };
            node = next;
            if let Some(record) = self.nodes[node].record {
                if matches!(chars.peek(), None | Some(&TAG_SEPARATOR)) {
                    best = Some(record);
                }
            }
        }

        best.map(|i| &self.records[i])
    }

    fn family(&self) -> Family {
        Family::Entity
    }

    fn records(&self) -> &[DelegationRecord] {
        &self.records
    }
}
