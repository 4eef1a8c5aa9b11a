mod launcher;
mod manifest;
mod release;
mod version;

pub use launcher::{AssetSelection, LauncherConfig, LauncherState};
pub use manifest::{Manifest, ManifestAsset, MANIFEST_FILE_NAME};
pub use release::{Asset, RateLimit, ReleaseDescriptor, RepoId, ResponseMeta};
pub use version::VersionEntry;
