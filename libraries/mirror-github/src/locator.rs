//! Repository location from a launcher's source page.

use crate::error::{GithubError, Result};
use crate::repo::{canonical_repo_url, parse_repo_url};
use reqwest::Client;
use tracing::debug;

/// Finds the GitHub repository a launcher publishes to.
///
/// A source URL that already is a repository URL is used as is. Otherwise
/// the page is fetched and its GitHub repository links are considered in
/// document order.
#[derive(Debug, Clone)]
pub struct RepoLocator {
    http: Client,
}

impl RepoLocator {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// Resolve the canonical repository URL for `source_url`.
    ///
    /// `selector` picks the first repository link whose URL contains it
    /// (case-insensitive); an empty selector picks the first link.
    pub async fn resolve(&self, source_url: &str, selector: &str) -> Result<String> {
        if let Ok(repo) = parse_repo_url(source_url) {
            return Ok(canonical_repo_url(&repo));
        }

        debug!(source_url = %source_url, "Fetching source page");
        let response = self
            .http
            .get(source_url)
            .send()
            .await
            .map_err(|e| GithubError::PageUnreachable(format!("{source_url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GithubError::PageUnreachable(format!(
                "{source_url}: status {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GithubError::PageUnreachable(format!("{source_url}: {e}")))?;

        select_repository(&body, selector).ok_or_else(|| GithubError::NoRepositoryLink {
            source_url: source_url.to_string(),
            selector: selector.to_string(),
        })
    }
}

/// Pick the first repository link in `html` matching `selector`.
pub(crate) fn select_repository(html: &str, selector: &str) -> Option<String> {
    let selector = selector.trim().to_lowercase();

    extract_hrefs(html)
        .filter(|href| selector.is_empty() || href.to_lowercase().contains(&selector))
        .find_map(|href| parse_repo_url(href).ok())
        .map(|repo| canonical_repo_url(&repo))
}

/// Iterate over `href` attribute values in document order.
fn extract_hrefs(html: &str) -> impl Iterator<Item = &str> {
    let mut rest = html;
    std::iter::from_fn(move || loop {
        let idx = find_ignore_case(rest, "href=")?;
        rest = &rest[idx + "href=".len()..];

        let quote = rest.chars().next()?;
        let (value, remaining) = if quote == '"' || quote == '\'' {
            let body = &rest[1..];
            let end = body.find(quote)?;
            (&body[..end], &body[end + 1..])
        } else {
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '>')
                .unwrap_or(rest.len());
            (&rest[..end], &rest[end..])
        };
        rest = remaining;

        if !value.is_empty() {
            return Some(value.trim());
        }
    })
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}
