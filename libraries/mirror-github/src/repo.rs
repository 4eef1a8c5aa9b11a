//! Repository URL parsing.

use crate::error::{GithubError, Result};
use mirror_core::RepoId;
use url::Url;

/// First path segments on github.com that are site pages, not owners.
const RESERVED_OWNERS: &[&str] = &[
    "about",
    "apps",
    "collections",
    "contact",
    "enterprise",
    "explore",
    "features",
    "issues",
    "login",
    "marketplace",
    "notifications",
    "orgs",
    "pricing",
    "pulls",
    "search",
    "settings",
    "site",
    "sponsors",
    "topics",
];

/// Parse a GitHub repository URL into its identity.
///
/// Accepts `https://github.com/<owner>/<repo>` with optional `www.`, a
/// trailing `.git`, or deeper paths such as `/releases`. A missing scheme
/// is treated as `https`.
pub fn parse_repo_url(repo_url: &str) -> Result<RepoId> {
    let invalid = || GithubError::InvalidRepoUrl(repo_url.to_string());

    let trimmed = repo_url.trim();
    let candidate = if trimmed.starts_with("//") {
        format!("https:{trimmed}")
    } else if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&candidate).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    match url.host_str() {
        Some("github.com" | "www.github.com") => {}
        _ => return Err(invalid()),
    }

    let mut segments = url
        .path_segments()
        .ok_or_else(invalid)?
        .filter(|s| !s.is_empty());
    let owner = segments.next().ok_or_else(invalid)?;
    let name = segments.next().ok_or_else(invalid)?;
    let name = name.strip_suffix(".git").unwrap_or(name);

    if RESERVED_OWNERS.contains(&owner.to_ascii_lowercase().as_str())
        || !is_valid_segment(owner)
        || !is_valid_segment(name)
    {
        return Err(invalid());
    }

    Ok(RepoId::new(owner, name))
}

/// Canonical `https://github.com/<owner>/<repo>` form of a repository.
pub fn canonical_repo_url(repo: &RepoId) -> String {
    format!("https://github.com/{}/{}", repo.owner, repo.name)
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
