//! `ReleaseResolver` implementation backed by GitHub.

use crate::client::GithubClient;
use crate::error::Result;
use crate::locator::RepoLocator;
use crate::rate_limit;
use crate::repo::parse_repo_url;
use crate::types::GithubConfig;
use async_trait::async_trait;
use mirror_core::{ReleaseDescriptor, ReleaseResolver, RepoId, ResponseMeta};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Resolves launcher repositories and releases on GitHub.
#[derive(Debug, Clone)]
pub struct GithubResolver {
    client: GithubClient,
    locator: RepoLocator,
    max_rate_limit_wait: Duration,
}

impl GithubResolver {
    pub fn new(config: GithubConfig) -> Result<Self> {
        let client = GithubClient::new(&config)?;
        let locator = RepoLocator::new(client.http().clone());

        Ok(Self {
            client,
            locator,
            max_rate_limit_wait: config.max_rate_limit_wait,
        })
    }

    pub fn client(&self) -> &GithubClient {
        &self.client
    }
}

#[async_trait]
impl ReleaseResolver for GithubResolver {
    async fn resolve_repository_url(
        &self,
        source_url: &str,
        selector: &str,
    ) -> mirror_core::Result<String> {
        Ok(self.locator.resolve(source_url, selector).await?)
    }

    fn parse_identity(&self, repo_url: &str) -> mirror_core::Result<RepoId> {
        Ok(parse_repo_url(repo_url)?)
    }

    async fn fetch_latest_release(
        &self,
        cancel: &CancellationToken,
        repo: &RepoId,
    ) -> mirror_core::Result<(ReleaseDescriptor, ResponseMeta)> {
        Ok(self.client.latest_release(cancel, repo).await?)
    }

    async fn handle_rate_limit(&self, meta: &ResponseMeta) -> Duration {
        rate_limit::wait_for_reset(meta, self.max_rate_limit_wait).await
    }
}
