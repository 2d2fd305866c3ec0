//! Longest-prefix matcher for IPv4 and IPv6 delegations
//!
//! Records are stored in a binary radix trie keyed by address bits, most
//! significant bit first. IPv4 addresses are left-aligned into the same
//! 128-bit key space, so both families share one implementation.
//!
//! A lookup descends along the query address for at most the query's own
//! prefix length and remembers the deepest node that carries a record. A
//! record therefore matches only if its prefix length is not longer than the
//! query's and their bits agree over the record's prefix length.
//!
//! # Example
//!
//! ```
//! use rdap_bootstrap::bootstrap::ip::IpPrefixMatcher;
//! use rdap_bootstrap::bootstrap::key::{normalize_ip, Family};
//! use rdap_bootstrap::bootstrap::matcher::Matcher;
//! use rdap_bootstrap::bootstrap::validate::prepare_batch;
//! use rdap_bootstrap::bootstrap::RawDelegation;
//!
//! let records = prepare_batch(
//!     Family::Ipv4,
//!     &[
//!         RawDelegation::new(Family::Ipv4, "10.0.0.0/8", ["https://a.example/"]),
//!         RawDelegation::new(Family::Ipv4, "10.1.0.0/16", ["https://b.example/"]),
//!     ],
//! )
//! .unwrap();
//! let matcher = IpPrefixMatcher::build(Family::Ipv4, records).unwrap();
//!
//! let hit = matcher.lookup(&normalize_ip("10.1.2.3", None).unwrap()).unwrap();
//! assert_eq!(hit.key().to_string(), "10.1.0.0/16");
//! ```

use super::key::{Family, PrefixKey};
use super::matcher::{check_family, Matcher};
use super::record::DelegationRecord;
use crate::error::RecordError;

/// One trie node; index 0 is the root (the `/0` position)
#[derive(Debug, Clone, Copy, Default)]
struct TrieNode {
    children: [Option<usize>; 2],
    record: Option<usize>,
}

/// Binary radix trie over IP network delegations
#[derive(Debug)]
pub struct IpPrefixMatcher {
    family: Family,
    nodes: Vec<TrieNode>,
    records: Vec<DelegationRecord>,
}

/// Left-aligned key bits and prefix length of an IP key
fn key_bits(key: &PrefixKey) -> Option<(u128, u8)> {
    match key {
        PrefixKey::Ipv4(net) => Some((
            u128::from(u32::from(net.network())) << 96,
            net.prefix_len(),
        )),
        PrefixKey::Ipv6(net) => Some((u128::from(net.network()), net.prefix_len())),
        _ => None,
    }
}

#[inline]
fn bit_at(bits: u128, depth: u8) -> usize {
    usize::from((bits >> (127 - u32::from(depth))) & 1 == 1)
}

impl IpPrefixMatcher {
    fn insert(&mut self, record: DelegationRecord) -> Result<(), RecordError> {
        let (bits, len) = key_bits(record.key()).ok_or_else(|| RecordError::FamilyMismatch {
            key: record.key().to_string(),
            expected: self.family,
            found: record.family(),
        })?;

        let mut node = 0;
        for depth in 0..len {
            let bit = bit_at(bits, depth);
            node = if let Some(next) = self.nodes[node].children[bit] {
                next
            } else {
                let next = self.nodes.len();
                self.nodes.push(TrieNode::default());
                self.nodes[node].children[bit] = Some(next);
                next
            };
        }

        if self.nodes[node].record.is_some() {
            return Err(RecordError::DuplicateKey {
                family: self.family,
                key: record.key().to_string(),
            });
        }
        self.nodes[node].record = Some(self.records.len());
        self.records.push(record);
        Ok(())
    }

    /// Number of trie nodes, including the root
    #[cfg(test)]
    fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Matcher for IpPrefixMatcher {
    fn build(family: Family, records: Vec<DelegationRecord>) -> Result<Self, RecordError> {
        let mut matcher = Self::empty(family);
        matcher.records.reserve(records.len());
        for record in records {
            check_family(family, &record)?;
            matcher.insert(record)?;
        }
        Ok(matcher)
    }

    fn empty(family: Family) -> Self {
        Self {
            family,
            nodes: vec![TrieNode::default()],
            records: Vec::new(),
        }
    }

    fn lookup(&self, key: &PrefixKey) -> Option<&DelegationRecord> {
        if key.family() != self.family {
            return None;
        }
        let (bits, len) = key_bits(key)?;

        let mut node = 0;
        let mut best = self.nodes[0].record;
        for depth in 0..len {
            let Some(next) = self.nodes[node].children[bit_at(bits, depth)] else {
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
        self.family
    }

    fn records(&self) -> &[DelegationRecord] {
        &self.records
    }
}
