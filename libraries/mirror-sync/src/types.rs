use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of one launcher task within a scan pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LauncherOutcome {
    /// A new version was mirrored and promoted
    Updated { version: String },
    /// Upstream version equals the known version, nothing written
    UpToDate { version: String },
    /// Resolution, provider, download or index failure
    Failed { reason: String },
    /// Task exceeded the per-launcher timeout
    TimedOut,
    /// Task was cancelled by shutdown
    Cancelled,
}

impl LauncherOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::TimedOut | Self::Cancelled)
    }
}

/// Outcome of a single launcher, tagged with its name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LauncherReport {
    pub launcher: String,
    #[serde(flatten)]
    pub outcome: LauncherOutcome,
}

/// Summary of a completed scan pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One report per configured launcher, in configuration order
    pub outcomes: Vec<LauncherReport>,
}

impl ScanSummary {
    pub fn updated_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|r| matches!(r.outcome, LauncherOutcome::Updated { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|r| r.outcome.is_failure()).count()
    }

    /// Outcome reported for `launcher`
    pub fn outcome(&self, launcher: &str) -> Option<&LauncherOutcome> {
        self.outcomes
            .iter()
            .find(|r| r.launcher == launcher)
            .map(|r| &r.outcome)
    }
}
