//! Bootstrap registry files
//!
//! Parses the IANA RDAP bootstrap service registries (RFC 7484): `ipv4.json`,
//! `ipv6.json`, `dns.json`, `asn.json`, and the object-tag registry of
//! RFC 8521 (`object-tags.json`).
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "publication": "2024-01-01T00:00:00Z",
//!   "services": [
//!     [["1.0.0.0/8", "27.0.0.0/8"], ["https://rdap.apnic.net/"]]
//!   ]
//! }
//! ```
//!
//! Object-tag services carry a leading contacts element:
//! `[["contact@example.net"], ["ARIN"], ["https://rdap.arin.net/registry/"]]`.
//!
//! This module only checks the file's shape. Keys and URLs are validated by
//! the registry when the batch is published, so one bad entry rejects the
//! whole family.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::key::Family;
use super::record::RawDelegation;
use crate::error::FeedError;

/// One parsed bootstrap registry file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapFile {
    /// Format version, "1.0" for all current registries
    pub version: String,

    /// Publication timestamp of this file
    #[serde(default)]
    pub publication: Option<String>,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Raw service entries
    pub services: Vec<Vec<Vec<String>>>,
}

/// Keys and URLs of one service entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapService<'a> {
    /// Delegated keys (networks, domains, AS ranges, tags)
    pub keys: &'a [String],

    /// Service URLs, most preferred first
    pub urls: &'a [String],
}

impl BootstrapFile {
    /// Parse a bootstrap file from JSON text
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Parse` if the text is not a bootstrap registry.
    pub fn from_json(json: &str) -> Result<Self, FeedError> {
        serde_json::from_str(json).map_err(|e| FeedError::parse("bootstrap JSON", e))
    }

    /// Load and parse a bootstrap file
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Io` if the file cannot be read, and
    /// `FeedError::Parse` if it is not a bootstrap registry.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FeedError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| FeedError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file = serde_json::from_str(&content)
            .map_err(|e| FeedError::parse(path.display().to_string(), e))?;
        debug!(path = %path.display(), "Loaded bootstrap file");
        Ok(file)
    }

    /// Split each service entry into keys and URLs
    ///
    /// # Errors
    ///
    /// Returns `FeedError::MalformedService` for entries that have neither
    /// two (`[keys, urls]`) nor three (`[contacts, keys, urls]`) elements.
    pub fn services(&self) -> Result<Vec<BootstrapService<'_>>, FeedError> {
        self.services
            .iter()
            .enumerate()
            .map(|(index, entry)| match entry.as_slice() {
                [keys, urls] | [_, keys, urls] => Ok(BootstrapService { keys, urls }),
                _ => Err(FeedError::MalformedService {
                    index,
                    len: entry.len(),
                }),
            })
            .collect()
    }

    /// Flatten the file into raw delegation records for `family`
    ///
    /// Every key of a service becomes its own record carrying the service's
    /// full URL list.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::MalformedService` as [`services`](Self::services).
    pub fn to_raw(&self, family: Family) -> Result<Vec<RawDelegation>, FeedError> {
        let mut raw = Vec::new();
        for service in self.services()? {
            raw.extend(
                service
                    .keys
                    .iter()
                    .map(|key| RawDelegation::new(family, key.clone(), service.urls.iter().cloned())),
            );
        }
        Ok(raw)
    }

    /// Number of service entries
    #[must_use]
    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}
