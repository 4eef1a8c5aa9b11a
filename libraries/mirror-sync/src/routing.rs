//! Download routing and public URL synthesis.
//!
//! Both are pure functions of configuration: the asset itself never
//! influences which route is taken.

use url::Url;

const GITHUB_ORIGIN: &str = "https://github.com/";

/// How asset downloads reach the origin.
///
/// An acceleration domain rewrites GitHub URLs to `https://<domain>/gh/...`.
/// Otherwise an asset proxy prefix is prepended to the origin URL. With
/// neither configured the origin URL is fetched directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetRouting {
    pub acceleration_domain: Option<String>,
    pub asset_proxy_url: Option<String>,
}

impl AssetRouting {
    /// URL to fetch for an asset published at `origin_url`
    pub fn route(&self, origin_url: &str) -> String {
        if let Some(domain) = non_empty(&self.acceleration_domain) {
            if let Some(path) = origin_url.strip_prefix(GITHUB_ORIGIN) {
                let domain = domain
                    .trim_start_matches("https://")
                    .trim_start_matches("http://")
                    .trim_end_matches('/');
                return format!("https://{domain}/gh/{path}");
            }
        }

        if let Some(proxy) = non_empty(&self.asset_proxy_url) {
            return format!("{}/{}", proxy.trim_end_matches('/'), origin_url);
        }

        origin_url.to_string()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Base of the externally reachable download URLs written to manifests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicUrls {
    base: String,
}

impl PublicUrls {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    /// Default base when no explicit one is configured
    pub fn for_server(address: &str, port: u16) -> Self {
        Self::new(format!("http://{address}:{port}/download"))
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// `<base>/<launcher>/<version>/<asset>` with each segment percent-encoded
    pub fn asset_url(&self, launcher: &str, version: &str, asset_name: &str) -> String {
        let segments = [launcher, version, asset_name];

        if let Ok(mut url) = Url::parse(&self.base) {
            if let Ok(mut path) = url.path_segments_mut() {
                path.pop_if_empty().extend(segments);
            }
            if !url.cannot_be_a_base() {
                return url.to_string();
            }
        }

        format!("{}/{}", self.base.trim_end_matches('/'), segments.join("/"))
    }
}
