//! Periodic scan trigger owned by the process lifecycle.

use crate::error::SyncError;
use crate::orchestrator::ScanOrchestrator;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Background task that triggers a scan pass on a fixed interval.
///
/// Ticks that land while a manual pass is running are dropped like any
/// other concurrent trigger. Missed ticks are not replayed.
pub struct ScanScheduler {
    orchestrator: Arc<ScanOrchestrator>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ScanScheduler {
    pub fn start(
        orchestrator: Arc<ScanOrchestrator>,
        period: Duration,
        scan_on_startup: bool,
    ) -> Self {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let task_orchestrator = orchestrator.clone();

        let handle = tokio::spawn(async move {
            let first_tick = if scan_on_startup {
                Instant::now()
            } else {
                Instant::now() + period
            };
            let mut ticker = interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(interval_secs = period.as_secs(), scan_on_startup, "Scan scheduler started");

            loop {
                tokio::select! {
                    biased;
                    () = task_cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                match task_orchestrator.scan().await {
                    Ok(summary) => info!(
                        updated = summary.updated_count(),
                        failed = summary.failed_count(),
                        "Scheduled scan finished"
                    ),
                    Err(SyncError::AlreadyRunning) => {
                        info!("Scheduled scan skipped, a pass is already running");
                    }
                    Err(e) => error!(error = %e, "Scheduled scan failed"),
                }
            }

            info!("Scan scheduler stopped");
        });

        Self {
            orchestrator,
            cancel,
            handle,
        }
    }

    /// Stop the scheduler and wait for it to exit.
    ///
    /// An in-flight pass is cancelled cooperatively: its launcher tasks
    /// unwind without touching durable state.
    pub async fn stop(self) {
        self.cancel.cancel();
        self.orchestrator.shutdown();
        if let Err(e) = self.handle.await {
            error!(error = %e, "Scan scheduler task failed");
        }
    }
}
