//! Error types for rdap-bootstrap
//!
//! Errors are split by the side of the registry they come from:
//!
//! - **Query side**: [`KeyError`] is raised when a query key cannot be
//!   normalized. The resolver recovers from it locally ("no redirect").
//! - **Sync side**: [`RecordError`], [`FeedError`] and [`SyncError`] describe
//!   rejected delegation batches. They are always reported to the caller.
//! - **Startup**: [`ConfigError`] covers configuration loading.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::bootstrap::key::Family;

/// Top-level error type for rdap-bootstrap
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Query key could not be normalized
    #[error("Invalid key: {0}")]
    InvalidKey(#[from] KeyError),

    /// Delegation record rejected
    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] RecordError),

    /// Bootstrap file could not be read or parsed
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    /// Synchronization failed
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Configuration errors (file parsing, validation)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl BootstrapError {
    /// Check if this error is recoverable (can retry operation)
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidKey(_) | Self::InvalidRecord(_) | Self::Config(_) => false,
            Self::Feed(e) => e.is_recoverable(),
            Self::Sync(e) => e.is_recoverable(),
        }
    }
}

/// A query key that cannot be normalized into a `PrefixKey`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Not an IPv4 or IPv6 literal
    #[error("malformed IP address: '{0}'")]
    MalformedAddress(String),

    /// Prefix length negative or wider than the address
    #[error("prefix length {len} out of range (max {max})")]
    PrefixLengthOutOfRange { len: i64, max: u8 },

    /// Empty domain name
    #[error("empty domain name")]
    EmptyDomain,

    /// Domain name with an empty label (e.g. `a..com`)
    #[error("empty label in domain name '{0}'")]
    EmptyLabel(String),

    /// AS number is not an integer or does not fit in 32 bits
    #[error("malformed AS number: '{0}'")]
    MalformedAsn(String),

    /// Negative AS number
    #[error("negative AS number: '{0}'")]
    NegativeAsn(String),

    /// AS range with low > high
    #[error("inverted AS range {low}-{high}")]
    InvertedAsnRange { low: u32, high: u32 },

    /// Empty entity tag
    #[error("empty entity tag")]
    EmptyTag,
}

/// A delegation record (or batch) rejected at load time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// The record's key descriptor could not be normalized
    #[error("invalid key '{descriptor}': {source}")]
    InvalidKey {
        descriptor: String,
        #[source]
        source: KeyError,
    },

    /// A record without any target URL
    #[error("record {key} has no target URLs")]
    EmptyTargets { key: String },

    /// A blank target string
    #[error("record {key} has invalid target URL '{url}': {reason}")]
    InvalidTarget {
        key: String,
        url: String,
        reason: String,
    },

    /// Two records with the same key in one batch
    #[error("duplicate {family} key {key}")]
    DuplicateKey { family: Family, key: String },

    /// Two AS ranges sharing at least one number
    #[error("overlapping AS ranges {first} and {second}")]
    OverlappingRange { first: String, second: String },

    /// A record handed to the wrong family
    #[error("record {key} belongs to family {found}, expected {expected}")]
    FamilyMismatch {
        key: String,
        expected: Family,
        found: Family,
    },
}

impl RecordError {
    /// Record errors require corrected source data
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        false
    }

    pub(crate) fn invalid_key(descriptor: impl Into<String>, source: KeyError) -> Self {
        Self::InvalidKey {
            descriptor: descriptor.into(),
            source,
        }
    }
}

/// Bootstrap file loading errors
#[derive(Debug, Error)]
pub enum FeedError {
    /// Bootstrap file could not be read
    #[error("failed to read bootstrap file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Bootstrap file is not valid JSON of the expected shape
    #[error("failed to parse bootstrap data ({context}): {reason}")]
    Parse { context: String, reason: String },

    /// A `services` entry that is neither `[keys, urls]` nor `[contacts, keys, urls]`
    #[error("malformed service entry #{index}: expected 2 or 3 elements, found {len}")]
    MalformedService { index: usize, len: usize },
}

impl FeedError {
    /// I/O failures may clear up on the next attempt; parse failures do not
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io { source, .. } => !matches!(
                source.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
            ),
            Self::Parse { .. } | Self::MalformedService { .. } => false,
        }
    }

    pub(crate) fn parse(context: impl Into<String>, reason: impl ToString) -> Self {
        Self::Parse {
            context: context.into(),
            reason: reason.to_string(),
        }
    }
}

/// Synchronization errors, always tagged with the affected family
#[derive(Debug, Error)]
pub enum SyncError {
    /// The family's bootstrap data could not be loaded
    #[error("{family}: {source}")]
    Feed {
        family: Family,
        #[source]
        source: FeedError,
    },

    /// The family's batch was rejected; the previous snapshot stays in effect
    #[error("{family}: batch rejected: {source}")]
    Rejected {
        family: Family,
        #[source]
        source: RecordError,
    },
}

impl SyncError {
    /// The family this error refers to
    #[must_use]
    pub const fn family(&self) -> Family {
        match self {
            Self::Feed { family, .. } | Self::Rejected { family, .. } => *family,
        }
    }

    /// Check if retrying the sync may succeed without data changes
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Feed { source, .. } => source.is_recoverable(),
            Self::Rejected { .. } => false,
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File not found or inaccessible
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Validation error (invalid values, missing required fields)
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// Environment variable error
    #[error("Environment variable error: {name}: {reason}")]
    EnvError { name: String, reason: String },

    /// I/O error while reading config
    #[error("I/O error reading configuration: {0}")]
    IoError(#[from] io::Error),
}

impl ConfigError {
    /// Config errors are generally not recoverable without user intervention
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        false
    }
}
