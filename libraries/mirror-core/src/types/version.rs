use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Durable record of a mirrored version
///
/// For each launcher at most one entry carries `is_latest = true` once the
/// index is in a stable state. Entries are never deleted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    /// Launcher name
    pub launcher: String,

    /// Version identifier
    pub version: String,

    /// Path of the version's manifest file
    pub manifest_path: PathBuf,

    /// Whether this version is advertised as current
    pub is_latest: bool,

    /// When the entry was first recorded
    pub created_at: DateTime<Utc>,
}
