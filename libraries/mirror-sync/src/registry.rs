//! In-memory runtime state of every configured launcher.

use chrono::Utc;
use mirror_core::{LauncherConfig, LauncherState, VersionStore};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Registry of launcher runtime state.
///
/// Constructed once at startup and shared by reference with the
/// orchestrator and its launcher tasks. Every access is one short critical
/// section that performs no I/O.
#[derive(Debug)]
pub struct LauncherRegistry {
    states: Mutex<HashMap<String, LauncherState>>,
}

impl LauncherRegistry {
    pub fn new(launchers: &[LauncherConfig]) -> Self {
        let states = launchers
            .iter()
            .map(|l| (l.name.clone(), LauncherState::new(&l.name)))
            .collect();
        Self {
            states: Mutex::new(states),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, LauncherState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed known versions from the durable index.
    ///
    /// Launchers whose lookup fails keep an unknown version and are
    /// re-checked on the next pass. Returns how many launchers were seeded.
    pub async fn hydrate(&self, store: &dyn VersionStore) -> usize {
        let names: Vec<String> = self.lock().keys().cloned().collect();
        let mut seeded = 0;

        for name in names {
            match store.latest_version(&name).await {
                Ok(Some(version)) => {
                    debug!(launcher = %name, version = %version, "Hydrated launcher state");
                    if let Some(state) = self.lock().get_mut(&name) {
                        state.version = Some(version);
                        seeded += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(launcher = %name, error = %e, "Failed to read latest version");
                }
            }
        }

        seeded
    }

    /// Whether `version` is the version already mirrored for `launcher`
    pub fn is_current(&self, launcher: &str, version: &str) -> bool {
        self.lock()
            .get(launcher)
            .is_some_and(|state| state.is_current(version))
    }

    /// Record a scan that found nothing new
    pub fn record_checked(&self, launcher: &str, repo_url: &str) {
        let mut states = self.lock();
        let state = states
            .entry(launcher.to_string())
            .or_insert_with(|| LauncherState::new(launcher));
        state.repo_url = Some(repo_url.to_string());
        state.last_scan_at = Some(Utc::now());
    }

    /// Record a newly mirrored version
    pub fn record_success(&self, launcher: &str, repo_url: &str, version: &str) {
        let mut states = self.lock();
        let state = states
            .entry(launcher.to_string())
            .or_insert_with(|| LauncherState::new(launcher));
        state.repo_url = Some(repo_url.to_string());
        state.version = Some(version.to_string());
        state.last_scan_at = Some(Utc::now());
    }

    pub fn get(&self, launcher: &str) -> Option<LauncherState> {
        self.lock().get(launcher).cloned()
    }

    /// Copy of every launcher's state, sorted by name
    pub fn snapshot(&self) -> Vec<LauncherState> {
        let mut states: Vec<LauncherState> = self.lock().values().cloned().collect();
        states.sort_by(|a, b| a.name.cmp(&b.name));
        states
    }
}
