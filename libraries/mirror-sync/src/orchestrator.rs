//! Scan pass orchestration.

use crate::error::{Result, SyncError};
use crate::gate::ScanGate;
use crate::registry::LauncherRegistry;
use crate::types::{LauncherOutcome, LauncherReport, ScanSummary};
use chrono::Utc;
use mirror_core::{
    LauncherConfig, MirrorError, ReleaseMirror, ReleaseResolver, VersionStore,
};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Default time budget of one launcher task
pub const DEFAULT_LAUNCHER_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Runs scan passes across every configured launcher.
///
/// A pass is `Idle -> Running -> Idle`: [`scan`](Self::scan) either takes the
/// single pass permit or returns [`SyncError::AlreadyRunning`] at once. Each
/// launcher runs as its own task, bounded by a timeout, so one launcher's
/// failure never delays the others.
pub struct ScanOrchestrator {
    worker: LauncherWorker,
    launchers: Vec<LauncherConfig>,
    gate: ScanGate,
    launcher_timeout: Duration,
    shutdown: CancellationToken,
}

/// Everything one launcher task needs, cheap to clone into the task
#[derive(Clone)]
struct LauncherWorker {
    resolver: Arc<dyn ReleaseResolver>,
    mirror: Arc<dyn ReleaseMirror>,
    store: Arc<dyn VersionStore>,
    registry: Arc<LauncherRegistry>,
}

impl ScanOrchestrator {
    pub fn new(
        launchers: Vec<LauncherConfig>,
        resolver: Arc<dyn ReleaseResolver>,
        mirror: Arc<dyn ReleaseMirror>,
        store: Arc<dyn VersionStore>,
        registry: Arc<LauncherRegistry>,
    ) -> Self {
        Self {
            worker: LauncherWorker {
                resolver,
                mirror,
                store,
                registry,
            },
            launchers,
            gate: ScanGate::new(),
            launcher_timeout: DEFAULT_LAUNCHER_TIMEOUT,
            shutdown: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_launcher_timeout(mut self, timeout: Duration) -> Self {
        self.launcher_timeout = timeout;
        self
    }

    pub fn launchers(&self) -> &[LauncherConfig] {
        &self.launchers
    }

    pub fn registry(&self) -> &Arc<LauncherRegistry> {
        &self.worker.registry
    }

    pub fn is_running(&self) -> bool {
        self.gate.is_running()
    }

    /// Cancel in-flight launcher tasks. Later passes report every launcher
    /// as cancelled.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Latest mirrored version of `launcher`, empty when there is none
    pub async fn latest_version(&self, launcher: &str) -> mirror_core::Result<String> {
        Ok(self
            .worker
            .store
            .latest_version(launcher)
            .await?
            .unwrap_or_default())
    }

    /// Run one scan pass over every launcher.
    pub async fn scan(&self) -> Result<ScanSummary> {
        let Some(_permit) = self.gate.try_begin() else {
            info!("Scan already in progress, dropping trigger");
            return Err(SyncError::AlreadyRunning);
        };

        let started_at = Utc::now();
        info!(launchers = self.launchers.len(), "Starting scan pass");

        let mut tasks = JoinSet::new();
        for (index, launcher) in self.launchers.iter().cloned().enumerate() {
            let worker = self.worker.clone();
            let cancel = self.shutdown.child_token();
            let timeout = self.launcher_timeout;

            tasks.spawn(async move {
                let outcome = worker.run(&launcher, cancel, timeout).await;
                (index, outcome)
            });
        }

        let mut outcomes: Vec<Option<LauncherOutcome>> =
            (0..self.launchers.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => error!(error = %e, "Launcher task panicked"),
            }
        }

        let outcomes: Vec<LauncherReport> = self
            .launchers
            .iter()
            .zip(outcomes)
            .map(|(launcher, outcome)| LauncherReport {
                launcher: launcher.name.clone(),
                outcome: outcome.unwrap_or_else(|| LauncherOutcome::Failed {
                    reason: "launcher task panicked".into(),
                }),
            })
            .collect();

        let summary = ScanSummary {
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };

        info!(
            updated = summary.updated_count(),
            failed = summary.failed_count(),
            total = summary.outcomes.len(),
            "Scan pass complete"
        );

        Ok(summary)
    }
}

/// Result of the cancellable part of a launcher cycle
enum Fetched {
    UpToDate {
        version: String,
    },
    Mirrored {
        repo_url: String,
        version: String,
        manifest_path: PathBuf,
    },
}

impl LauncherWorker {
    async fn run(
        &self,
        launcher: &LauncherConfig,
        cancel: CancellationToken,
        timeout: Duration,
    ) -> LauncherOutcome {
        let name = launcher.name.as_str();

        let fetched = match tokio::time::timeout(timeout, self.fetch(launcher, &cancel)).await {
            Ok(Ok(fetched)) => fetched,
            Ok(Err(MirrorError::Cancelled)) => {
                info!(launcher = %name, "Launcher cycle cancelled");
                return LauncherOutcome::Cancelled;
            }
            Ok(Err(e)) => {
                warn!(launcher = %name, error = %e, "Launcher cycle failed");
                return LauncherOutcome::Failed {
                    reason: e.to_string(),
                };
            }
            Err(_) => {
                cancel.cancel();
                warn!(launcher = %name, timeout_secs = timeout.as_secs(), "Launcher cycle timed out");
                return LauncherOutcome::TimedOut;
            }
        };

        match fetched {
            Fetched::UpToDate { version } => LauncherOutcome::UpToDate { version },
            Fetched::Mirrored {
                repo_url,
                version,
                manifest_path,
            } => {
                // The index writes run on their own task so that dropping
                // the pass cannot stop them between clear and update.
                let worker = self.clone();
                let launcher_name = name.to_string();
                let commit = tokio::spawn(async move {
                    worker
                        .commit(&launcher_name, &repo_url, &version, &manifest_path)
                        .await
                        .map(|()| version)
                });

                match commit.await {
                    Ok(Ok(version)) => LauncherOutcome::Updated { version },
                    Ok(Err(e)) => LauncherOutcome::Failed {
                        reason: e.to_string(),
                    },
                    Err(e) => {
                        error!(launcher = %name, error = %e, "Index update task failed");
                        LauncherOutcome::Failed {
                            reason: "index update task failed".into(),
                        }
                    }
                }
            }
        }
    }

    /// Network part of a cycle: resolve, fetch and mirror. Never writes the index.
    async fn fetch(
        &self,
        launcher: &LauncherConfig,
        cancel: &CancellationToken,
    ) -> mirror_core::Result<Fetched> {
        let name = launcher.name.as_str();

        let repo_url = cancellable(
            cancel,
            self.resolver
                .resolve_repository_url(&launcher.source_url, &launcher.repo_selector),
        )
        .await?;
        let repo = self.resolver.parse_identity(&repo_url)?;

        let release = match self.resolver.fetch_latest_release(cancel, &repo).await {
            Ok((release, _meta)) => release,
            Err(e) => {
                if let Some(meta) = e.response_meta() {
                    let waited = cancellable(cancel, async {
                        Ok(self.resolver.handle_rate_limit(meta).await)
                    })
                    .await?;
                    if !waited.is_zero() {
                        warn!(
                            launcher = %name,
                            waited_secs = waited.as_secs(),
                            "Rate limit backoff finished, retrying next pass"
                        );
                    }
                }
                return Err(e);
            }
        };

        if release.version.is_empty() {
            return Err(MirrorError::provider(format!(
                "Latest release of {repo} has no version identifier"
            )));
        }

        if self.registry.is_current(name, &release.version) {
            debug!(launcher = %name, version = %release.version, "Already up to date");
            self.registry.record_checked(name, &repo_url);
            return Ok(Fetched::UpToDate {
                version: release.version,
            });
        }

        info!(launcher = %name, version = %release.version, "New version found");
        let manifest_path = self.mirror.fetch_release(cancel, launcher, &release).await?;

        Ok(Fetched::Mirrored {
            repo_url,
            version: release.version,
            manifest_path,
        })
    }

    /// Promote the mirrored version and record it in the registry
    async fn commit(
        &self,
        name: &str,
        repo_url: &str,
        version: &str,
        manifest_path: &Path,
    ) -> mirror_core::Result<()> {
        if let Err(e) = self.store.promote(name, version, manifest_path).await {
            error!(launcher = %name, version = %version, error = %e, "Failed to record new version");
            return Err(e);
        }

        self.registry.record_success(name, repo_url, version);
        info!(launcher = %name, version = %version, "Launcher updated");
        Ok(())
    }
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = mirror_core::Result<T>>,
) -> mirror_core::Result<T> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(MirrorError::Cancelled),
        result = fut => result,
    }
}
