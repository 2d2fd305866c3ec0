//! Resolver facade
//!
//! Single entry point for request handlers. A query is normalized, looked up
//! in the registry, and turned into a redirect target. The facade never
//! fails: a key that cannot be normalized cannot match any delegation, so it
//! resolves to "no redirect" just like an unmatched key.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::key::{normalize_asn, normalize_domain, normalize_entity, normalize_ip, PrefixKey};
use super::registry::{RedirectRegistry, RedirectTarget};
use crate::error::KeyError;

/// Typed, already classified redirect query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectQuery {
    /// IPv4 or IPv6 address, optionally with a prefix length
    ///
    /// `address` may also carry the length inline (`192.0.2.0/24`).
    Ip {
        /// Address literal
        address: String,
        /// Explicit prefix length
        prefix_len: Option<i64>,
    },

    /// Domain name
    Domain(String),

    /// AS number (`64512`, `AS64512`) or range (`64512-64520`)
    Autnum(String),

    /// Entity handle
    Entity(String),
}

impl RedirectQuery {
    /// IP query
    #[must_use]
    pub fn ip(address: impl Into<String>, prefix_len: Option<i64>) -> Self {
        Self::Ip {
            address: address.into(),
            prefix_len,
        }
    }

    /// Domain query
    #[must_use]
    pub fn domain(name: impl Into<String>) -> Self {
        Self::Domain(name.into())
    }

    /// AS number query
    #[must_use]
    pub fn autnum(asn: impl Into<String>) -> Self {
        Self::Autnum(asn.into())
    }

    /// Entity query
    #[must_use]
    pub fn entity(handle: impl Into<String>) -> Self {
        Self::Entity(handle.into())
    }

    /// Build a query from an RDAP object class name and a value
    ///
    /// Accepts `ip`, `domain`, `autnum` (or `asn`) and `entity`.
    #[must_use]
    pub fn from_parts(kind: &str, value: &str) -> Option<Self> {
        match kind.to_ascii_lowercase().as_str() {
            "ip" => Some(Self::ip(value, None)),
            "domain" => Some(Self::domain(value)),
            "autnum" | "asn" => Some(Self::autnum(value)),
            "entity" => Some(Self::entity(value)),
            _ => None,
        }
    }

    /// RDAP object class name of the query
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Ip { .. } => "ip",
            Self::Domain(_) => "domain",
            Self::Autnum(_) => "autnum",
            Self::Entity(_) => "entity",
        }
    }

    /// Normalize the query into a registry key
    ///
    /// # Errors
    ///
    /// Returns the `KeyError` of the family-specific normalization.
    pub fn normalize(&self) -> Result<PrefixKey, KeyError> {
        match self {
            Self::Ip {
                address,
                prefix_len,
            } => normalize_ip(address, *prefix_len),
            Self::Domain(name) => normalize_domain(name),
            Self::Autnum(asn) => normalize_asn(asn),
            Self::Entity(handle) => normalize_entity(handle),
        }
    }

    /// Path segments of the RDAP lookup for this query
    ///
    /// e.g. `["ip", "192.0.2.0", "24"]` or `["autnum", "64512"]`.
    #[must_use]
    pub fn rdap_segments(&self) -> Vec<String> {
        let mut segments = vec![self.kind().to_string()];
        match self {
            Self::Ip {
                address,
                prefix_len,
            } => {
                let address = address.trim();
                match (address.split_once('/'), prefix_len) {
                    (Some((addr, len)), _) => {
                        segments.push(addr.trim().to_string());
                        segments.push(len.trim().to_string());
                    }
                    (None, Some(len)) => {
                        segments.push(address.to_string());
                        segments.push(len.to_string());
                    }
                    (None, None) => segments.push(address.to_string()),
                }
            }
            Self::Domain(name) => {
                let name = name.trim();
                segments.push(name.strip_suffix('.').unwrap_or(name).to_string());
            }
            Self::Autnum(asn) => {
                let asn = asn.trim();
                let number = asn
                    .get(..2)
                    .filter(|p| p.eq_ignore_ascii_case("as"))
                    .map_or(asn, |_| &asn[2..]);
                segments.push(number.to_string());
            }
            Self::Entity(handle) => segments.push(handle.trim().to_string()),
        }
        segments
    }
}

impl fmt::Display for RedirectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rdap_segments().join("/"))
    }
}

/// Resolver behavior options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    /// Return the first `https` mirror instead of the first listed URL
    pub prefer_https: bool,
}

/// Resolver facade over a shared registry
#[derive(Debug, Clone)]
pub struct Resolver {
    registry: Arc<RedirectRegistry>,
    options: ResolverOptions,
}

impl Resolver {
    /// Create a resolver with default options
    #[must_use]
    pub fn new(registry: Arc<RedirectRegistry>) -> Self {
        Self::with_options(registry, ResolverOptions::default())
    }

    /// Create a resolver with the given options
    #[must_use]
    pub fn with_options(registry: Arc<RedirectRegistry>, options: ResolverOptions) -> Self {
        Self { registry, options }
    }

    /// Resolve a query to its redirect target
    ///
    /// `None` means no delegation applies and the resource is local. Keys
    /// that fail to normalize also yield `None`.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use rdap_bootstrap::bootstrap::{RedirectQuery, RedirectRegistry, Resolver};
    ///
    /// let resolver = Resolver::new(Arc::new(RedirectRegistry::new()));
    /// assert!(resolver.resolve(&RedirectQuery::ip("", None)).is_none());
    /// ```
    #[must_use]
    pub fn resolve(&self, query: &RedirectQuery) -> Option<RedirectTarget> {
        let key = match query.normalize() {
            Ok(key) => key,
            Err(e) => {
                debug!(query = %query, error = %e, "Query key does not normalize, no redirect");
                return None;
            }
        };

        let target = self.registry.resolve(&key)?;
        Some(if self.options.prefer_https {
            target.prefer_https()
        } else {
            target
        })
    }

    /// Resolve a query straight to the full redirect URL
    #[must_use]
    pub fn redirect_location(&self, query: &RedirectQuery) -> Option<Url> {
        let target = self.resolve(query)?;
        match target.location(query) {
            Ok(url) => Some(url),
            Err(e) => {
                debug!(query = %query, base = %target.url, error = %e, "Cannot build redirect URL");
                None
            }
        }
    }

    /// Options in effect
    #[must_use]
    pub fn options(&self) -> ResolverOptions {
        self.options
    }

    /// The underlying registry
    #[must_use]
    pub fn registry(&self) -> &Arc<RedirectRegistry> {
        &self.registry
    }
}
