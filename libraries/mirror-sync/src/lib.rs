//! Launcher Mirror Sync Engine
//!
//! Runs scan passes across every configured launcher and mirrors new
//! releases into the local directory tree.
//!
//! # Components
//!
//! - [`ScanOrchestrator`]: one pass at a time, one isolated task per launcher
//! - [`DownloadManager`]: bounded-concurrency asset fetches with atomic placement
//! - [`LauncherRegistry`]: in-memory runtime state shared by launcher tasks
//! - [`ScanScheduler`]: owned periodic trigger, stopped with the process
//!
//! Mirror layout on disk:
//!
//! ```text
//! <base>/<launcher>/<version>/<asset files>
//! <base>/<launcher>/<version>/info.json
//! <base>/<launcher>/.partial/           (staging, never served)
//! ```

mod download;
mod error;
mod gate;
mod orchestrator;
mod registry;
mod routing;
mod scheduler;
mod types;

pub use download::{DownloadManager, DownloadSettings};
pub use error::{Result, SyncError};
pub use gate::{ScanGate, ScanPermit};
pub use orchestrator::{ScanOrchestrator, DEFAULT_LAUNCHER_TIMEOUT};
pub use registry::LauncherRegistry;
pub use routing::{AssetRouting, PublicUrls};
pub use scheduler::ScanScheduler;
pub use types::{LauncherOutcome, LauncherReport, ScanSummary};
