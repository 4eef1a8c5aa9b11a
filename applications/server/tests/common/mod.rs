/// Common test utilities and fixtures
use async_trait::async_trait;
use axum::Router;
use mirror_core::{
    Asset, LauncherConfig, MirrorError, ReleaseDescriptor, ReleaseMirror, ReleaseResolver, RepoId,
    ResponseMeta, Result, VersionStore,
};
use mirror_server::{api, state::AppState};
use mirror_storage::VersionIndex;
use mirror_sync::{LauncherRegistry, ScanOrchestrator};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

pub const LAUNCHER: &str = "demo";

/// Resolver that always reports the same release
pub struct StaticResolver {
    pub version: String,
    pub delay: Duration,
}

#[async_trait]
impl ReleaseResolver for StaticResolver {
    async fn resolve_repository_url(&self, source_url: &str, _selector: &str) -> Result<String> {
        Ok(source_url.to_string())
    }

    fn parse_identity(&self, _repo_url: &str) -> Result<RepoId> {
        Ok(RepoId::new("demo", "demo"))
    }

    async fn fetch_latest_release(
        &self,
        cancel: &CancellationToken,
        _repo: &RepoId,
    ) -> Result<(ReleaseDescriptor, ResponseMeta)> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(MirrorError::Cancelled),
            () = tokio::time::sleep(self.delay) => {}
        }
        Ok((
            ReleaseDescriptor::from_parts(
                &self.version,
                "",
                vec![Asset::new(
                    "demo.apk",
                    "https://github.com/demo/demo/releases/download/demo.apk",
                    5,
                )],
            ),
            ResponseMeta::new(200),
        ))
    }

    async fn handle_rate_limit(&self, _meta: &ResponseMeta) -> Duration {
        Duration::ZERO
    }
}

/// Mirror that writes a single small asset and a manifest stub
pub struct LocalMirror {
    pub root: PathBuf,
}

#[async_trait]
impl ReleaseMirror for LocalMirror {
    async fn fetch_release(
        &self,
        _cancel: &CancellationToken,
        launcher: &LauncherConfig,
        release: &ReleaseDescriptor,
    ) -> Result<PathBuf> {
        let dir = self.root.join(&launcher.name).join(&release.version);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join("demo.apk"), b"hello").await?;

        let manifest = dir.join("info.json");
        tokio::fs::write(&manifest, br#"{"assets":[]}"#).await?;
        Ok(manifest)
    }
}

/// A router over a real version index and stub upstream collaborators
pub struct TestApp {
    pub router: Router,
    pub index: Arc<VersionIndex>,
    pub orchestrator: Arc<ScanOrchestrator>,
    pub mirror_root: PathBuf,
    _temp_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_resolver_delay(Duration::ZERO).await
    }

    pub async fn with_resolver_delay(delay: Duration) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mirror_root = temp_dir.path().join("mirror");
        std::fs::create_dir_all(&mirror_root).expect("Failed to create mirror root");

        let db_url = format!("sqlite://{}", temp_dir.path().join("versions.db").display());
        let pool = mirror_storage::create_pool(&db_url)
            .await
            .expect("Failed to create pool");
        mirror_storage::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let index = Arc::new(VersionIndex::new(pool));

        let launchers = vec![LauncherConfig::new(LAUNCHER, "https://github.com/demo/demo")];
        let registry = Arc::new(LauncherRegistry::new(&launchers));
        registry.hydrate(index.as_ref()).await;

        let orchestrator = Arc::new(ScanOrchestrator::new(
            launchers,
            Arc::new(StaticResolver {
                version: "1.0.0".to_string(),
                delay,
            }),
            Arc::new(LocalMirror {
                root: mirror_root.clone(),
            }),
            index.clone(),
            registry,
        ));

        let store: Arc<dyn VersionStore> = index.clone();
        let router = api::router(AppState::new(orchestrator.clone(), store), &mirror_root);

        Self {
            router,
            index,
            orchestrator,
            mirror_root,
            _temp_dir: temp_dir,
        }
    }

    pub fn manifest_path(&self, version: &str) -> PathBuf {
        self.mirror_root.join(LAUNCHER).join(version).join("info.json")
    }
}

/// Promote a version directly through the index
pub async fn seed_version(index: &VersionIndex, version: &str, manifest: &Path) {
    index
        .promote(LAUNCHER, version, manifest)
        .await
        .expect("Failed to seed version");
}
