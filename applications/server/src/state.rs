/// Shared application state
use mirror_core::VersionStore;
use mirror_sync::ScanOrchestrator;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ScanOrchestrator>,
    pub store: Arc<dyn VersionStore>,
}

impl AppState {
    pub fn new(orchestrator: Arc<ScanOrchestrator>, store: Arc<dyn VersionStore>) -> Self {
        Self {
            orchestrator,
            store,
        }
    }
}
