//! GitHub releases API client.

use crate::error::{GithubError, Result};
use crate::rate_limit;
use crate::types::{ApiRelease, GithubConfig};
use mirror_core::{ReleaseDescriptor, RepoId, ResponseMeta};
use reqwest::{header, Client};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Client for the GitHub REST releases API.
///
/// Every call is a single request; retries and backoff are left to the
/// caller so a scan pass never hammers the API.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    api_base: String,
    token: Option<String>,
}

impl GithubClient {
    /// Create a new client with the given configuration.
    pub fn new(config: &GithubConfig) -> Result<Self> {
        let api_base = config.api_base.trim_end_matches('/').to_string();
        if !api_base.starts_with("http://") && !api_base.starts_with("https://") {
            return Err(GithubError::Config(
                "API base must start with http:// or https://".into(),
            ));
        }

        let http = build_http_client(config)?;

        Ok(Self {
            http,
            api_base,
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Underlying HTTP client, shared with the source-page locator.
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Fetch the newest published release of `repo`.
    ///
    /// Cancelling `cancel` aborts the in-flight request.
    pub async fn latest_release(
        &self,
        cancel: &CancellationToken,
        repo: &RepoId,
    ) -> Result<(ReleaseDescriptor, ResponseMeta)> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(GithubError::Cancelled),
            result = self.request_latest_release(repo) => result,
        }
    }

    async fn request_latest_release(
        &self,
        repo: &RepoId,
    ) -> Result<(ReleaseDescriptor, ResponseMeta)> {
        let url = format!(
            "{}/repos/{}/{}/releases/latest",
            self.api_base, repo.owner, repo.name
        );
        debug!(url = %url, "Fetching latest release");

        let mut request = self
            .http
            .get(&url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let meta = rate_limit::response_meta(status.as_u16(), response.headers());

        if status.is_success() {
            let release: ApiRelease = response.json().await.map_err(|e| {
                GithubError::ParseError(format!("Failed to parse release for {repo}: {e}"))
            })?;
            let descriptor = ReleaseDescriptor::from(release);

            info!(
                repo = %repo,
                version = %descriptor.version,
                assets = descriptor.assets.len(),
                "Fetched latest release"
            );

            return Ok((descriptor, meta));
        }

        if rate_limit::is_rate_limited(&meta) {
            return Err(GithubError::RateLimited { meta });
        }
        if status.as_u16() == 404 {
            return Err(GithubError::NoRelease(repo.to_string()));
        }

        let error_text = response.text().await.unwrap_or_default();
        Err(GithubError::Api {
            message: error_text,
            meta,
        })
    }
}

fn build_http_client(config: &GithubConfig) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(config.request_timeout)
        .connect_timeout(std::time::Duration::from_secs(10))
        .user_agent(format!("launcher-mirror/{}", env!("CARGO_PKG_VERSION")));

    if let Some(proxy_url) = config.proxy_url.as_deref().filter(|p| !p.is_empty()) {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| GithubError::Config(format!("Invalid proxy URL {proxy_url}: {e}")))?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(GithubError::Request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_validation() {
        assert!(GithubClient::new(&GithubConfig::default()).is_ok());
        assert!(GithubClient::new(&GithubConfig::with_api_base("http://localhost:9000/")).is_ok());
        assert!(GithubClient::new(&GithubConfig::with_api_base("api.github.com")).is_err());
    }

    #[test]
    fn test_empty_token_ignored() {
        let client = GithubClient::new(&GithubConfig::default().token("")).unwrap();
        assert!(client.token.is_none());
    }
}
