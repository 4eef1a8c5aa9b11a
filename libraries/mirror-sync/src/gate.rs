//! Scan pass exclusivity.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Single-permit, non-blocking gate around scan passes.
///
/// `try_begin` never waits: when a pass is already running the caller gets
/// `None` and must drop the trigger. Triggers are not queued.
#[derive(Debug, Clone)]
pub struct ScanGate {
    permits: Arc<Semaphore>,
}

/// Held for the duration of a scan pass; dropping it reopens the gate.
#[derive(Debug)]
pub struct ScanPermit {
    _permit: OwnedSemaphorePermit,
}

impl ScanGate {
    pub fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn try_begin(&self) -> Option<ScanPermit> {
        self.permits
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| ScanPermit { _permit: permit })
    }

    pub fn is_running(&self) -> bool {
        self.permits.available_permits() == 0
    }
}

impl Default for ScanGate {
    fn default() -> Self {
        Self::new()
    }
}
