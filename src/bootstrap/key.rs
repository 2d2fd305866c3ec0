//! Prefix keys and query normalization
//!
//! Every resource family has its own canonical key shape:
//!
//! | Family | Key | Specificity |
//! |--------|-----|-------------|
//! | IPv4 / IPv6 | network address + prefix length | longer prefix wins |
//! | Domain | labels, most general first | more labels wins |
//! | ASN | inclusive range `[low, high]` | the containing range |
//! | Entity | upper-cased tag | longer suffix wins |
//!
//! Normalization turns raw query text into a [`PrefixKey`] or fails with a
//! [`KeyError`]. IP addresses are masked to the supplied prefix length, so
//! `1.0.0.0/0` normalizes to `0.0.0.0/0`. Records go through the same
//! path, so a stored IP key is always canonical.

use std::fmt;
use std::net::IpAddr;

use ipnet::{Ipv4Net, Ipv6Net};
use serde::{Deserialize, Serialize};

use crate::error::KeyError;

/// Resource family handled by an independent matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// IPv4 networks
    Ipv4,
    /// IPv6 networks
    Ipv6,
    /// Forward DNS domain names
    Domain,
    /// Autonomous system number ranges
    Asn,
    /// Entity handle tags (object tags)
    Entity,
}

impl Family {
    /// All families, in registry order
    pub const ALL: [Self; 5] = [Self::Ipv4, Self::Ipv6, Self::Domain, Self::Asn, Self::Entity];

    /// Convert to string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ipv4 => "ipv4",
            Self::Ipv6 => "ipv6",
            Self::Domain => "domain",
            Self::Asn => "asn",
            Self::Entity => "entity",
        }
    }

    /// Dense index, used for per-family counters
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::Ipv4 => 0,
            Self::Ipv6 => 1,
            Self::Domain => 2,
            Self::Asn => 3,
            Self::Entity => 4,
        }
    }

    /// Check if this family is keyed by IP networks
    #[must_use]
    pub const fn is_ip(&self) -> bool {
        matches!(self, Self::Ipv4 | Self::Ipv6)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain name as a label sequence, most general label first
///
/// `www.example.com` is stored as `["com", "example", "www"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainKey {
    labels: Vec<String>,
}

impl DomainKey {
    /// Labels, top-level domain first
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of labels
    #[must_use]
    pub fn depth(&self) -> usize {
        self.labels.len()
    }
}

impl fmt::Display for DomainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, label) in self.labels.iter().rev().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(label)?;
        }
        Ok(())
    }
}

/// Inclusive range of AS numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AsnRange {
    low: u32,
    high: u32,
}

impl AsnRange {
    /// Create a range
    ///
    /// # Errors
    ///
    /// Returns `KeyError::InvertedAsnRange` if `low > high`.
    pub fn new(low: u32, high: u32) -> Result<Self, KeyError> {
        if low > high {
            return Err(KeyError::InvertedAsnRange { low, high });
        }
        Ok(Self { low, high })
    }

    /// Range covering a single AS number
    #[must_use]
    pub const fn single(asn: u32) -> Self {
        Self { low: asn, high: asn }
    }

    /// Lowest AS number in the range
    #[must_use]
    pub const fn low(&self) -> u32 {
        self.low
    }

    /// Highest AS number in the range
    #[must_use]
    pub const fn high(&self) -> u32 {
        self.high
    }

    /// Check if `other` lies entirely within this range
    #[must_use]
    pub const fn contains(&self, other: &Self) -> bool {
        self.low <= other.low && other.high <= self.high
    }

    /// Check if the two ranges share at least one AS number
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.low <= other.high && other.low <= self.high
    }
}

impl fmt::Display for AsnRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.low == self.high {
            write!(f, "{}", self.low)
        } else {
            write!(f, "{}-{}", self.low, self.high)
        }
    }
}

/// Entity handle tag, upper-cased
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityTag(String);

impl EntityTag {
    /// The normalized tag text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical key of one resource family
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrefixKey {
    /// IPv4 network, host bits zero
    Ipv4(Ipv4Net),
    /// IPv6 network, host bits zero
    Ipv6(Ipv6Net),
    /// Domain label sequence
    Domain(DomainKey),
    /// AS number range
    Asn(AsnRange),
    /// Entity tag
    Entity(EntityTag),
}

impl PrefixKey {
    /// Family of this key
    #[must_use]
    pub const fn family(&self) -> Family {
        match self {
            Self::Ipv4(_) => Family::Ipv4,
            Self::Ipv6(_) => Family::Ipv6,
            Self::Domain(_) => Family::Domain,
            Self::Asn(_) => Family::Asn,
            Self::Entity(_) => Family::Entity,
        }
    }

    /// Prefix length for IP keys
    #[must_use]
    pub fn prefix_len(&self) -> Option<u8> {
        match self {
            Self::Ipv4(net) => Some(net.prefix_len()),
            Self::Ipv6(net) => Some(net.prefix_len()),
            _ => None,
        }
    }
}

impl fmt::Display for PrefixKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ipv4(net) => write!(f, "{net}"),
            Self::Ipv6(net) => write!(f, "{net}"),
            Self::Domain(d) => write!(f, "{d}"),
            Self::Asn(r) => write!(f, "{r}"),
            Self::Entity(t) => write!(f, "{t}"),
        }
    }
}

/// Build an IP key without checking host bits
fn ip_key(address: IpAddr, prefix_len: u8) -> Result<PrefixKey, KeyError> {
    match address {
        IpAddr::V4(v4) => Ipv4Net::new(v4, prefix_len)
            .map(PrefixKey::Ipv4)
            .map_err(|_| KeyError::PrefixLengthOutOfRange {
                len: i64::from(prefix_len),
                max: 32,
            }),
        IpAddr::V6(v6) => Ipv6Net::new(v6, prefix_len)
            .map(PrefixKey::Ipv6)
            .map_err(|_| KeyError::PrefixLengthOutOfRange {
                len: i64::from(prefix_len),
                max: 128,
            }),
    }
}

/// Normalize an IP query
///
/// `address` may carry its own `/len` suffix when `prefix_len` is `None`.
/// Without any prefix length the full address width is used. The address is
/// masked to the prefix length.
///
/// # Errors
///
/// Returns `KeyError::MalformedAddress` for anything that is not an IP
/// literal, and `KeyError::PrefixLengthOutOfRange` for negative or too-wide
/// prefix lengths.
///
/// # Example
///
/// ```
/// use rdap_bootstrap::bootstrap::key::normalize_ip;
///
/// let key = normalize_ip("1.0.0.7", Some(24)).unwrap();
/// assert_eq!(key.to_string(), "1.0.0.0/24");
///
/// let key = normalize_ip("2001:db8::1", None).unwrap();
/// assert_eq!(key.to_string(), "2001:db8::1/128");
/// ```
pub fn normalize_ip(address: &str, prefix_len: Option<i64>) -> Result<PrefixKey, KeyError> {
    let trimmed = address.trim();
    let (literal, len) = match (trimmed.split_once('/'), prefix_len) {
        (Some((literal, len_text)), None) => {
            let len = len_text
                .trim()
                .parse::<i64>()
                .map_err(|_| KeyError::MalformedAddress(address.to_string()))?;
            (literal.trim(), Some(len))
        }
        // Both an inline and an explicit prefix length
        (Some(_), Some(_)) => return Err(KeyError::MalformedAddress(address.to_string())),
        (None, len) => (trimmed, len),
    };

    let ip: IpAddr = literal
        .parse()
        .map_err(|_| KeyError::MalformedAddress(address.to_string()))?;
    let max: u8 = if ip.is_ipv4() { 32 } else { 128 };

    let len = match len {
        None => max,
        Some(n) => u8::try_from(n)
            .ok()
            .filter(|n| *n <= max)
            .ok_or(KeyError::PrefixLengthOutOfRange { len: n, max })?,
    };

    Ok(match ip_key(ip, len)? {
        PrefixKey::Ipv4(net) => PrefixKey::Ipv4(net.trunc()),
        PrefixKey::Ipv6(net) => PrefixKey::Ipv6(net.trunc()),
        other => other,
    })
}

/// Normalize a domain name
///
/// Lower-cases, drops one trailing dot, and reverses the label order.
///
/// # Errors
///
/// Returns `KeyError::EmptyDomain` for an empty name and
/// `KeyError::EmptyLabel` for names such as `a..com`.
///
/// # Example
///
/// ```
/// use rdap_bootstrap::bootstrap::key::{normalize_domain, PrefixKey};
///
/// let PrefixKey::Domain(key) = normalize_domain("WWW.Example.com.").unwrap() else {
///     unreachable!()
/// };
/// assert_eq!(key.labels(), ["com", "example", "www"]);
/// ```
pub fn normalize_domain(domain: &str) -> Result<PrefixKey, KeyError> {
    let trimmed = domain.trim();
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Err(KeyError::EmptyDomain);
    }

    let lower = trimmed.to_ascii_lowercase();
    let mut labels = Vec::new();
    for label in lower.rsplit('.') {
        if label.is_empty() {
            return Err(KeyError::EmptyLabel(domain.to_string()));
        }
        labels.push(label.to_string());
    }

    Ok(PrefixKey::Domain(DomainKey { labels }))
}

/// Normalize an AS number or inclusive AS range
///
/// Accepts `64512`, `AS64512` and `64512-65534`.
///
/// # Errors
///
/// Returns `KeyError::NegativeAsn`, `KeyError::MalformedAsn` or
/// `KeyError::InvertedAsnRange`.
pub fn normalize_asn(asn: &str) -> Result<PrefixKey, KeyError> {
    let trimmed = asn.trim();
    let body = trimmed
        .strip_prefix("AS")
        .or_else(|| trimmed.strip_prefix("as"))
        .or_else(|| trimmed.strip_prefix("As"))
        .unwrap_or(trimmed);

    if body.starts_with('-') {
        return Err(KeyError::NegativeAsn(asn.to_string()));
    }

    let range = match body.split_once('-') {
        Some((low, high)) => {
            AsnRange::new(parse_asn_number(low, asn)?, parse_asn_number(high, asn)?)?
        }
        None => AsnRange::single(parse_asn_number(body, asn)?),
    };
    Ok(PrefixKey::Asn(range))
}

/// Normalize a numeric AS range supplied as integers
///
/// # Errors
///
/// Returns `KeyError::NegativeAsn` or `KeyError::MalformedAsn` if either end
/// is outside `0..=u32::MAX`, and `KeyError::InvertedAsnRange` if
/// `low > high`.
pub fn normalize_asn_range(low: i64, high: i64) -> Result<PrefixKey, KeyError> {
    let convert = |n: i64| {
        if n < 0 {
            Err(KeyError::NegativeAsn(n.to_string()))
        } else {
            u32::try_from(n).map_err(|_| KeyError::MalformedAsn(n.to_string()))
        }
    };
    Ok(PrefixKey::Asn(AsnRange::new(convert(low)?, convert(high)?)?))
}

fn parse_asn_number(text: &str, original: &str) -> Result<u32, KeyError> {
    let n: i64 = text
        .trim()
        .parse()
        .map_err(|_| KeyError::MalformedAsn(original.to_string()))?;
    if n < 0 {
        return Err(KeyError::NegativeAsn(original.to_string()));
    }
    u32::try_from(n).map_err(|_| KeyError::MalformedAsn(original.to_string()))
}

/// Normalize an entity handle or tag
///
/// # Errors
///
/// Returns `KeyError::EmptyTag` for an empty string.
pub fn normalize_entity(handle: &str) -> Result<PrefixKey, KeyError> {
    let trimmed = handle.trim();
    if trimmed.is_empty() {
        return Err(KeyError::EmptyTag);
    }
    Ok(PrefixKey::Entity(EntityTag(trimmed.to_uppercase())))
}

/// Normalize a record or query descriptor for the given family
///
/// # Errors
///
/// Propagates the family-specific normalization error.
pub fn normalize(family: Family, descriptor: &str) -> Result<PrefixKey, KeyError> {
    let key = match family {
        Family::Ipv4 | Family::Ipv6 => normalize_ip(descriptor, None)?,
        Family::Domain => normalize_domain(descriptor)?,
        Family::Asn => normalize_asn(descriptor)?,
        Family::Entity => normalize_entity(descriptor)?,
    };
    // An IPv6 literal in the IPv4 family (or vice versa) is not a valid key
    if key.family() != family {
        return Err(KeyError::MalformedAddress(descriptor.to_string()));
    }
    Ok(key)
}
