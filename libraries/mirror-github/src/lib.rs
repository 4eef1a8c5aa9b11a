//! Launcher Mirror GitHub Resolver
//!
//! Resolves a launcher's GitHub repository and fetches its newest release.
//!
//! # Features
//!
//! - **Repository location**: accept a repository URL directly or pick one from a source page
//! - **Identity parsing**: split repository URLs into owner and name
//! - **Latest release**: one cancellable call to the releases API
//! - **Rate limits**: parse rate-limit headers and wait for the reset, bounded by a ceiling
//!
//! # Example
//!
//! ```ignore
//! use mirror_core::ReleaseResolver;
//! use mirror_github::{GithubConfig, GithubResolver};
//! use tokio_util::sync::CancellationToken;
//!
//! let resolver = GithubResolver::new(GithubConfig::default())?;
//! let repo_url = resolver
//!     .resolve_repository_url("https://github.com/HMCL-dev/HMCL", "")
//!     .await?;
//! let repo = resolver.parse_identity(&repo_url)?;
//! let (release, _meta) = resolver
//!     .fetch_latest_release(&CancellationToken::new(), &repo)
//!     .await?;
//! println!("{} is at {}", repo, release.version);
//! ```

mod client;
mod error;
mod locator;
pub mod rate_limit;
mod repo;
mod resolver;
mod types;

pub use client::GithubClient;
pub use error::{GithubError, Result};
pub use locator::RepoLocator;
pub use repo::{canonical_repo_url, parse_repo_url};
pub use resolver::GithubResolver;
pub use types::{ApiAsset, ApiRelease, GithubConfig, DEFAULT_API_BASE};
