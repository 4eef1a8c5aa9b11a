//! Per-version manifest written next to the mirrored assets

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// File name of the manifest inside a version directory
pub const MANIFEST_FILE_NAME: &str = "info.json";

/// Metadata describing one mirrored version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Launcher name
    pub launcher: String,
    /// Version identifier
    pub version: String,
    /// When the version finished mirroring
    pub mirrored_at: DateTime<Utc>,
    /// Mirrored assets with their public URLs
    pub assets: Vec<ManifestAsset>,
}

/// A mirrored asset as advertised to downstream clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestAsset {
    /// File name inside the version directory
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Externally reachable download URL
    pub url: String,
}

impl Manifest {
    /// File names of all mirrored assets
    pub fn asset_names(&self) -> impl Iterator<Item = &str> {
        self.assets.iter().map(|a| a.name.as_str())
    }
}
