//! Release descriptor and provider response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Repository identity on the release-hosting provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    /// Owner (user or organization)
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepoId {
    /// Create a repository identity
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A downloadable file attached to a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// File name
    pub name: String,
    /// Origin download URL
    pub url: String,
    /// Declared size in bytes
    pub size: u64,
}

impl Asset {
    /// Create an asset
    pub fn new(name: impl Into<String>, url: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            size,
        }
    }
}

/// Newest release of a repository, one per scan attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDescriptor {
    /// Version identifier (tag name, falling back to display name)
    pub version: String,
    /// Assets in provider order
    pub assets: Vec<Asset>,
}

impl ReleaseDescriptor {
    /// Build a descriptor, using `name` as the version when `tag` is empty
    pub fn from_parts(tag: &str, name: &str, assets: Vec<Asset>) -> Self {
        let version = if tag.trim().is_empty() { name } else { tag };
        Self {
            version: version.trim().to_string(),
            assets,
        }
    }
}

/// Rate-limit information reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    /// Requests allowed per window
    pub limit: Option<u64>,
    /// Requests left in the current window
    pub remaining: Option<u64>,
    /// When the current window resets
    pub reset_at: Option<DateTime<Utc>>,
    /// Explicit wait requested by the provider
    pub retry_after: Option<Duration>,
}

impl RateLimit {
    /// Whether the provider reports no requests left
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }
}

/// Metadata of a provider response, kept so callers can honor rate limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// HTTP status code
    pub status: u16,
    /// Parsed rate-limit headers, if any were present
    pub rate_limit: Option<RateLimit>,
}

impl ResponseMeta {
    /// Metadata with only a status code
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            rate_limit: None,
        }
    }

    /// Attach rate-limit information
    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: RateLimit) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }
}
