//! Types for the GitHub releases API.

use mirror_core::{Asset, ReleaseDescriptor};
use serde::Deserialize;
use std::time::Duration;

/// Default GitHub REST API base.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Configuration for the GitHub resolver.
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// REST API base URL (overridable for GitHub Enterprise and tests)
    pub api_base: String,
    /// Personal access token, raises the rate limit when present
    pub token: Option<String>,
    /// Outbound HTTP proxy for every request
    pub proxy_url: Option<String>,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Longest time a rate-limit backoff may block
    pub max_rate_limit_wait: Duration,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: None,
            proxy_url: None,
            request_timeout: Duration::from_secs(30),
            max_rate_limit_wait: Duration::from_secs(15 * 60),
        }
    }
}

impl GithubConfig {
    /// Config pointing at a custom API base.
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            ..Self::default()
        }
    }

    /// Set the access token.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

// =============================================================================
// API payloads
// =============================================================================

/// Release object returned by `GET /repos/{owner}/{repo}/releases/latest`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRelease {
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub assets: Vec<ApiAsset>,
}

/// Asset object inside a release.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiAsset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
}

impl From<ApiRelease> for ReleaseDescriptor {
    fn from(release: ApiRelease) -> Self {
        let assets = release
            .assets
            .into_iter()
            .map(|a| Asset::new(a.name, a.browser_download_url, a.size))
            .collect();

        ReleaseDescriptor::from_parts(
            &release.tag_name,
            release.name.as_deref().unwrap_or_default(),
            assets,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_payload_conversion() {
        let json = r#"{
            "tag_name": "",
            "name": "Nightly",
            "assets": [
                {"name": "a.apk", "browser_download_url": "https://github.com/o/r/releases/download/n/a.apk", "size": 4096}
            ]
        }"#;
        let release: ApiRelease = serde_json::from_str(json).unwrap();
        let descriptor = ReleaseDescriptor::from(release);

        assert_eq!(descriptor.version, "Nightly");
        assert_eq!(descriptor.assets.len(), 1);
        assert_eq!(descriptor.assets[0].size, 4096);
    }

    #[test]
    fn test_null_release_name() {
        let json = r#"{"tag_name": "v2", "name": null}"#;
        let release: ApiRelease = serde_json::from_str(json).unwrap();
        let descriptor = ReleaseDescriptor::from(release);
        assert_eq!(descriptor.version, "v2");
        assert!(descriptor.assets.is_empty());
    }
}
