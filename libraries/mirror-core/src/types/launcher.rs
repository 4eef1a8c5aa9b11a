//! Launcher types
//!
//! A launcher is a configured upstream artifact source whose newest release is
//! mirrored. `LauncherConfig` is loaded once; `LauncherState` is the mutable
//! in-memory view owned by the scan orchestrator.

use crate::types::Asset;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable launcher configuration, keyed by `name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LauncherConfig {
    /// Unique launcher name, also the directory name under the mirror root
    pub name: String,

    /// Page (or repository URL) the repository is located from
    pub source_url: String,

    /// Repository-selection rule applied to links found on `source_url`
    #[serde(default)]
    pub repo_selector: String,

    /// Which release assets get mirrored
    #[serde(default)]
    pub assets: AssetSelection,
}

impl LauncherConfig {
    /// Create a launcher that mirrors every asset of `source_url`
    pub fn new(name: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_url: source_url.into(),
            repo_selector: String::new(),
            assets: AssetSelection::default(),
        }
    }

    /// Set the repository selector
    #[must_use]
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.repo_selector = selector.into();
        self
    }

    /// Set the asset selection policy
    #[must_use]
    pub fn with_assets(mut self, assets: AssetSelection) -> Self {
        self.assets = assets;
        self
    }
}

/// Asset selection policy for a launcher
///
/// An asset is kept when its name contains one of `include` (or `include` is
/// empty) and none of `exclude`. Matching is case-insensitive. The default
/// policy keeps every asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSelection {
    /// Substrings of which at least one must appear in the asset name
    #[serde(default)]
    pub include: Vec<String>,

    /// Substrings none of which may appear in the asset name
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl AssetSelection {
    /// Whether an asset with this file name is selected
    #[must_use]
    pub fn matches(&self, asset_name: &str) -> bool {
        let name = asset_name.to_lowercase();
        let included = self.include.is_empty()
            || self
                .include
                .iter()
                .any(|pattern| name.contains(&pattern.to_lowercase()));
        let excluded = self
            .exclude
            .iter()
            .any(|pattern| name.contains(&pattern.to_lowercase()));

        included && !excluded
    }

    /// Select the matching assets, preserving descriptor order
    #[must_use]
    pub fn select<'a>(&self, assets: &'a [Asset]) -> Vec<&'a Asset> {
        assets.iter().filter(|a| self.matches(&a.name)).collect()
    }
}

/// Runtime state of a launcher for the lifetime of the process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LauncherState {
    /// Launcher name
    pub name: String,

    /// Repository URL resolved on the last successful cycle
    pub repo_url: Option<String>,

    /// Currently known (mirrored) version
    pub version: Option<String>,

    /// Completion time of the last successful cycle
    pub last_scan_at: Option<DateTime<Utc>>,
}

impl LauncherState {
    /// Create an empty state for a launcher
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Whether `version` is the version already mirrored
    #[must_use]
    pub fn is_current(&self, version: &str) -> bool {
        self.version.as_deref() == Some(version)
    }
}
