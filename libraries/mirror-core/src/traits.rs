/// Collaborator traits of the mirror synchronization engine
use crate::error::Result;
use crate::types::{LauncherConfig, ReleaseDescriptor, RepoId, ResponseMeta, VersionEntry};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Durable index of mirrored versions
///
/// Implementations serialize their own writes: callers never coordinate
/// `clear_latest` and `update` across launchers.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Set `is_latest = false` on every entry of `launcher`. Idempotent.
    async fn clear_latest(&self, launcher: &str) -> Result<()>;

    /// Upsert the `(launcher, version)` entry with `is_latest = true`
    async fn update(&self, launcher: &str, version: &str, manifest_path: &Path) -> Result<()>;

    /// Version of the entry currently marked latest, if any
    async fn latest_version(&self, launcher: &str) -> Result<Option<String>>;

    /// All recorded versions of `launcher`, newest first
    async fn history(&self, launcher: &str) -> Result<Vec<VersionEntry>>;

    /// Make `version` the single latest entry of `launcher`
    ///
    /// Runs `clear_latest` then `update` as two separate store operations,
    /// not a transaction. A crash between them leaves the launcher with no
    /// latest entry until the next successful cycle promotes again. A failed
    /// `clear_latest` is logged and does not stop the `update`.
    async fn promote(&self, launcher: &str, version: &str, manifest_path: &Path) -> Result<()> {
        if let Err(e) = self.clear_latest(launcher).await {
            warn!(launcher = %launcher, error = %e, "Failed to clear latest flags");
        }
        self.update(launcher, version, manifest_path).await
    }
}

/// Locates a launcher's repository and its newest release
#[async_trait]
pub trait ReleaseResolver: Send + Sync {
    /// Resolve the repository URL for a launcher source page
    async fn resolve_repository_url(&self, source_url: &str, selector: &str) -> Result<String>;

    /// Split a repository URL into owner and name
    fn parse_identity(&self, repo_url: &str) -> Result<RepoId>;

    /// Fetch the newest release with one cancellable provider call
    async fn fetch_latest_release(
        &self,
        cancel: &CancellationToken,
        repo: &RepoId,
    ) -> Result<(ReleaseDescriptor, ResponseMeta)>;

    /// Block until an exhausted rate limit resets (bounded by a ceiling)
    ///
    /// Returns how long the caller was held. The request is never retried
    /// here; the current cycle is reported as failed.
    async fn handle_rate_limit(&self, meta: &ResponseMeta) -> Duration;
}

/// Places a release's assets into the mirror tree
#[async_trait]
pub trait ReleaseMirror: Send + Sync {
    /// Mirror `release` for `launcher`, returning the manifest path
    async fn fetch_release(
        &self,
        cancel: &CancellationToken,
        launcher: &LauncherConfig,
        release: &ReleaseDescriptor,
    ) -> Result<PathBuf>;
}
