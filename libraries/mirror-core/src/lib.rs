//! Launcher Mirror Core
//!
//! Shared domain types, traits, and error handling for the launcher mirror.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `LauncherConfig`, `ReleaseDescriptor`, `VersionEntry`, `Manifest`, etc.
//! - **Collaborator Traits**: `VersionStore`, `ReleaseResolver`, `ReleaseMirror`
//! - **Error Handling**: Unified `MirrorError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use mirror_core::types::{Asset, AssetSelection, ReleaseDescriptor};
//!
//! let release = ReleaseDescriptor::from_parts(
//!     "",
//!     "1.2.0",
//!     vec![Asset::new("app-arm64.apk", "https://example.com/a.apk", 4096)],
//! );
//! assert_eq!(release.version, "1.2.0");
//!
//! let selection = AssetSelection::default();
//! assert_eq!(selection.select(&release.assets).len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{MirrorError, Result};
pub use traits::{ReleaseMirror, ReleaseResolver, VersionStore};
pub use types::{
    Asset, AssetSelection, LauncherConfig, LauncherState, Manifest, ManifestAsset, RateLimit,
    ReleaseDescriptor, RepoId, ResponseMeta, VersionEntry,
};
