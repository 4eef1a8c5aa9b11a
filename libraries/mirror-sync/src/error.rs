use mirror_core::MirrorError;
use thiserror::Error;

/// Errors that can occur when triggering a scan
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Scan already in progress")]
    AlreadyRunning,

    #[error(transparent)]
    Mirror(#[from] MirrorError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
