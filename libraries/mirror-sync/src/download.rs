//! Release mirroring into the local directory tree.

use crate::routing::{AssetRouting, PublicUrls};
use async_trait::async_trait;
use chrono::Utc;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use mirror_core::types::MANIFEST_FILE_NAME;
use mirror_core::{
    Asset, LauncherConfig, Manifest, ManifestAsset, MirrorError, ReleaseDescriptor,
    ReleaseMirror, Result,
};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Staging directory name inside each launcher directory
const STAGING_DIR: &str = ".partial";

/// Settings for [`DownloadManager`]
#[derive(Debug, Clone)]
pub struct DownloadSettings {
    /// Root of the mirror tree
    pub base_dir: PathBuf,
    /// Maximum parallel asset downloads per release
    pub concurrency: usize,
    /// Outbound HTTP proxy for asset downloads
    pub proxy_url: Option<String>,
    pub routing: AssetRouting,
    pub public: PublicUrls,
    /// Remove older version directories after a successful mirror
    pub cleanup_old: bool,
}

impl DownloadSettings {
    pub fn new(base_dir: impl Into<PathBuf>, public: PublicUrls) -> Self {
        Self {
            base_dir: base_dir.into(),
            concurrency: 4,
            proxy_url: None,
            routing: AssetRouting::default(),
            public,
            cleanup_old: true,
        }
    }
}

/// Downloads release assets with bounded concurrency.
///
/// Assets are streamed into a per-attempt staging directory and only moved
/// into `<base>/<launcher>/<version>/` once every selected asset has arrived
/// with its declared size. The manifest is written last. A failed, timed out
/// or cancelled attempt leaves nothing behind but the previous versions.
pub struct DownloadManager {
    http: Client,
    settings: DownloadSettings,
}

impl DownloadManager {
    pub fn new(settings: DownloadSettings) -> Result<Self> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .user_agent(format!("launcher-mirror/{}", env!("CARGO_PKG_VERSION")));

        if let Some(proxy_url) = settings.proxy_url.as_deref().filter(|p| !p.is_empty()) {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| MirrorError::Config(format!("Invalid proxy URL {proxy_url}: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let http = builder
            .build()
            .map_err(|e| MirrorError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &DownloadSettings {
        &self.settings
    }

    /// Directory holding every mirrored version of `launcher`
    pub fn launcher_dir(&self, launcher: &str) -> PathBuf {
        self.settings.base_dir.join(launcher)
    }

    /// Directory of one mirrored version
    pub fn version_dir(&self, launcher: &str, version: &str) -> PathBuf {
        self.launcher_dir(launcher).join(version)
    }

    async fn mirror(
        &self,
        cancel: &CancellationToken,
        launcher: &LauncherConfig,
        release: &ReleaseDescriptor,
    ) -> Result<PathBuf> {
        validate_segment("launcher name", &launcher.name)?;
        validate_segment("version", &release.version)?;

        let selected = launcher.assets.select(&release.assets);
        if selected.is_empty() {
            return Err(MirrorError::download(format!(
                "No assets selected from release {} of {}",
                release.version, launcher.name
            )));
        }
        for asset in &selected {
            validate_asset_name(&asset.name)?;
        }

        let launcher_dir = self.launcher_dir(&launcher.name);
        let version_dir = launcher_dir.join(&release.version);
        let staging = Staging::create(
            launcher_dir
                .join(STAGING_DIR)
                .join(format!("{}-{}", release.version, Uuid::new_v4())),
        )
        .await?;

        info!(
            launcher = %launcher.name,
            version = %release.version,
            assets = selected.len(),
            concurrency = self.settings.concurrency,
            "Mirroring release"
        );

        let staging_path = staging.path();
        let pending: Vec<Asset> = selected.iter().map(|asset| (*asset).clone()).collect();
        stream::iter(pending)
            .map(move |asset| async move {
                self.download_asset(cancel, &asset, staging_path).await
            })
            .buffer_unordered(self.settings.concurrency.max(1))
            .try_collect::<Vec<()>>()
            .await?;

        tokio::fs::create_dir_all(&version_dir).await?;
        for asset in &selected {
            tokio::fs::rename(staging.path().join(&asset.name), version_dir.join(&asset.name))
                .await?;
        }

        let manifest = Manifest {
            launcher: launcher.name.clone(),
            version: release.version.clone(),
            mirrored_at: Utc::now(),
            assets: selected
                .iter()
                .map(|asset| ManifestAsset {
                    name: asset.name.clone(),
                    size: asset.size,
                    url: self
                        .settings
                        .public
                        .asset_url(&launcher.name, &release.version, &asset.name),
                })
                .collect(),
        };
        let manifest_path = version_dir.join(MANIFEST_FILE_NAME);
        let staged_manifest = staging.path().join(MANIFEST_FILE_NAME);
        let body = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| MirrorError::download(format!("Failed to encode manifest: {e}")))?;
        tokio::fs::write(&staged_manifest, body).await?;
        tokio::fs::rename(&staged_manifest, &manifest_path).await?;

        drop(staging);

        if self.settings.cleanup_old {
            remove_old_versions(&launcher_dir, &release.version).await;
        }

        info!(
            launcher = %launcher.name,
            version = %release.version,
            manifest = %manifest_path.display(),
            "Release mirrored"
        );

        Ok(manifest_path)
    }

    async fn download_asset(
        &self,
        cancel: &CancellationToken,
        asset: &Asset,
        staging: &Path,
    ) -> Result<()> {
        let url = self.settings.routing.route(&asset.url);
        let dest = staging.join(&asset.name);
        debug!(url = %url, dest = %dest.display(), "Downloading asset");

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(MirrorError::Cancelled),
            response = self.http.get(&url).send() => response
                .map_err(|e| MirrorError::download(format!("{}: {e}", asset.name)))?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(MirrorError::download(format!(
                "{}: status {status} from {url}",
                asset.name
            )));
        }

        let mut file = File::create(&dest).await?;
        let mut received: u64 = 0;
        let mut body = response.bytes_stream();

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(MirrorError::Cancelled),
                next = body.next() => next,
            };
            let Some(chunk) = next else { break };
            let chunk = chunk.map_err(|e| MirrorError::download(format!("{}: {e}", asset.name)))?;

            received += chunk.len() as u64;
            if received > asset.size {
                break;
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        drop(file);

        if received != asset.size {
            return Err(MirrorError::SizeMismatch {
                name: asset.name.clone(),
                expected: asset.size,
                actual: received,
            });
        }

        debug!(asset = %asset.name, size = received, "Asset downloaded");
        Ok(())
    }
}

#[async_trait]
impl ReleaseMirror for DownloadManager {
    async fn fetch_release(
        &self,
        cancel: &CancellationToken,
        launcher: &LauncherConfig,
        release: &ReleaseDescriptor,
    ) -> Result<PathBuf> {
        self.mirror(cancel, launcher, release).await
    }
}

/// Per-attempt staging directory, removed when dropped.
///
/// Dropping also covers the timeout path, where the whole mirror future is
/// dropped mid-transfer.
struct Staging {
    path: PathBuf,
}

impl Staging {
    async fn create(path: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&path).await?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "Failed to remove staging directory");
            }
        }
    }
}

/// Remove every version directory of a launcher except `keep`.
///
/// Dot-directories (staging) are never versions. Failures are logged; the
/// new version is already in place at this point.
async fn remove_old_versions(launcher_dir: &Path, keep: &str) {
    let mut entries = match tokio::fs::read_dir(launcher_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %launcher_dir.display(), error = %e, "Failed to list versions for cleanup");
            return;
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(dir = %launcher_dir.display(), error = %e, "Failed to list versions for cleanup");
                break;
            }
        };

        let name = entry.file_name().to_string_lossy().to_string();
        if name == keep || name.starts_with('.') {
            continue;
        }
        if !entry.file_type().await.is_ok_and(|t| t.is_dir()) {
            continue;
        }

        match tokio::fs::remove_dir_all(entry.path()).await {
            Ok(()) => info!(version = %name, dir = %launcher_dir.display(), "Removed old version"),
            Err(e) => warn!(version = %name, error = %e, "Failed to remove old version"),
        }
    }
}

fn validate_segment(what: &str, value: &str) -> Result<()> {
    let invalid = value.is_empty()
        || value == "."
        || value == ".."
        || value.starts_with('.')
        || value.contains(['/', '\\'])
        || value.contains('\0');

    if invalid {
        return Err(MirrorError::download(format!(
            "Invalid {what} for a mirror path: {value:?}"
        )));
    }
    Ok(())
}

fn validate_asset_name(name: &str) -> Result<()> {
    validate_segment("asset name", name)?;
    if name == MANIFEST_FILE_NAME {
        return Err(MirrorError::download(format!(
            "Asset name {name:?} collides with the manifest"
        )));
    }
    Ok(())
}
