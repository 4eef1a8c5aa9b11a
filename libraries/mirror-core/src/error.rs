/// Core error types for the launcher mirror
use crate::types::ResponseMeta;
use thiserror::Error;

/// Result type alias using `MirrorError`
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Core error type shared by every mirror component
///
/// Each variant maps to one failure class of a launcher cycle. None of them is
/// fatal to the process; the orchestrator logs and moves on.
#[derive(Error, Debug)]
pub enum MirrorError {
    /// Repository URL or identity could not be determined
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// Repository URL does not have the provider's shape
    #[error("Invalid repository URL: {0}")]
    Parse(String),

    /// Release provider call failed
    #[error("Provider error: {message}")]
    Provider {
        /// Human readable cause
        message: String,
        /// Response metadata, when a response was received at all
        meta: Option<ResponseMeta>,
    },

    /// Provider rate limit is exhausted
    #[error("Rate limit exhausted (status {})", meta.status)]
    RateLimited {
        /// Response metadata carrying the reset information
        meta: ResponseMeta,
    },

    /// Asset transfer or placement failed
    #[error("Download error: {0}")]
    Download(String),

    /// Downloaded asset size differs from the declared size
    #[error("Size mismatch for {name}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Asset file name
        name: String,
        /// Size declared by the release descriptor
        expected: u64,
        /// Bytes actually received
        actual: u64,
    },

    /// Durable version index write or read failed
    #[error("Index error: {0}")]
    Index(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation was cancelled
    #[error("Operation cancelled")]
    Cancelled,

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MirrorError {
    /// Create a resolution error
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Create a provider error without response metadata
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider {
            message: msg.into(),
            meta: None,
        }
    }

    /// Create a download error
    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download(msg.into())
    }

    /// Create an index error
    pub fn index(msg: impl Into<String>) -> Self {
        Self::Index(msg.into())
    }

    /// Response metadata attached to provider failures
    #[must_use]
    pub fn response_meta(&self) -> Option<&ResponseMeta> {
        match self {
            Self::Provider { meta, .. } => meta.as_ref(),
            Self::RateLimited { meta } => Some(meta),
            _ => None,
        }
    }

    /// Whether this error signals an exhausted provider rate limit
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}
