//! Error types for the GitHub resolver.

use mirror_core::{MirrorError, ResponseMeta};
use thiserror::Error;

/// Errors that can occur when talking to GitHub or a launcher source page.
#[derive(Error, Debug)]
pub enum GithubError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// API returned an error response
    #[error("GitHub API error ({}): {message}", meta.status)]
    Api { message: String, meta: ResponseMeta },

    /// Repository has no published release
    #[error("No published release for {0}")]
    NoRelease(String),

    /// Rate limit exhausted
    #[error("Rate limit exhausted (status {})", meta.status)]
    RateLimited { meta: ResponseMeta },

    /// URL is not a GitHub repository URL
    #[error("Invalid repository URL: {0}")]
    InvalidRepoUrl(String),

    /// Source page could not be fetched
    #[error("Source page unreachable: {0}")]
    PageUnreachable(String),

    /// Source page had no matching repository link
    #[error("No repository link matching {selector:?} on {source_url}")]
    NoRepositoryLink { source_url: String, selector: String },

    /// Failed to parse an API response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Request was cancelled by the caller
    #[error("Request cancelled")]
    Cancelled,
}

/// Result type for GitHub resolver operations.
pub type Result<T> = std::result::Result<T, GithubError>;

impl From<GithubError> for MirrorError {
    fn from(err: GithubError) -> Self {
        match err {
            GithubError::RateLimited { meta } => MirrorError::RateLimited { meta },
            GithubError::Api { message, meta } => MirrorError::Provider {
                message,
                meta: Some(meta),
            },
            GithubError::InvalidRepoUrl(url) => MirrorError::Parse(url),
            e @ (GithubError::PageUnreachable(_) | GithubError::NoRepositoryLink { .. }) => {
                MirrorError::resolution(e.to_string())
            }
            GithubError::Config(msg) => MirrorError::Config(msg),
            GithubError::Cancelled => MirrorError::Cancelled,
            e => MirrorError::provider(e.to_string()),
        }
    }
}
