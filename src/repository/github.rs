// src/repository/github.rs

//! GitHub DESCRIPTION retrieval
//!
//! A GitHub package pins by external identity: `owner/repo` at an optional
//! ref (default branch otherwise). Resolution walks the API to a concrete
//! commit, then reads the DESCRIPTION at that commit. The cached payload
//! records the commit so a primed cache is stable across branch moves.

use crate::error::{Error, Result};
use serde_json::{json, Value};
use tracing::debug;

use super::client::HttpClient;

const GITHUB_API: &str = "https://api.github.com";
const GITHUB_RAW: &str = "https://raw.githubusercontent.com";

/// A parsed `owner/repo[@ref]` locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubSlug {
    pub owner: String,
    pub repo: String,
    pub git_ref: Option<String>,
}

impl GithubSlug {
    /// Parse a locator string; the ref after `@` is optional
    pub fn parse(locator: &str) -> Result<Self> {
        let (slug, git_ref) = match locator.split_once('@') {
            Some((slug, git_ref)) => (slug, Some(git_ref.to_string())),
            None => (locator, None),
        };
        let (owner, repo) = slug.split_once('/').ok_or_else(|| {
            Error::InvalidManifest(format!(
                "GitHub package '{}' must use owner/repo format",
                locator
            ))
        })?;
        if owner.is_empty() || repo.is_empty() {
            return Err(Error::InvalidManifest(format!(
                "GitHub package '{}' must use owner/repo format",
                locator
            )));
        }
        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            git_ref,
        })
    }

    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Fetch the DESCRIPTION for a slug, resolving the ref to a commit first
///
/// Returns a payload `{owner, repo, ref, commit, description}` suitable for
/// caching, or None when the repository, ref, or DESCRIPTION does not exist.
pub fn fetch_github_description(
    client: &HttpClient,
    slug: &GithubSlug,
    token: Option<&str>,
) -> Result<Option<Value>> {
    let git_ref = match &slug.git_ref {
        Some(git_ref) => git_ref.clone(),
        None => match default_branch(client, slug, token)? {
            Some(branch) => branch,
            None => return Ok(None),
        },
    };

    let commit_url = format!(
        "{}/repos/{}/{}/commits/{}",
        GITHUB_API, slug.owner, slug.repo, git_ref
    );
    let commit = match client.get_json_opt(&commit_url, token)? {
        Some(commit) => commit,
        None => return Ok(None),
    };
    let sha = commit
        .get("sha")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            Error::MetadataUnavailable(format!(
                "no commit found for {}@{}",
                slug.slug(),
                git_ref
            ))
        })?
        .to_string();

    debug!("{}@{} resolved to {}", slug.slug(), git_ref, sha);

    let description_url = format!(
        "{}/{}/{}/{}/DESCRIPTION",
        GITHUB_RAW, slug.owner, slug.repo, sha
    );
    let description = match client.get_text_opt(&description_url, token)? {
        Some(description) => description,
        None => return Ok(None),
    };

    Ok(Some(json!({
        "owner": slug.owner,
        "repo": slug.repo,
        "ref": git_ref,
        "commit": sha,
        "description": description,
    })))
}

fn default_branch(
    client: &HttpClient,
    slug: &GithubSlug,
    token: Option<&str>,
) -> Result<Option<String>> {
    let url = format!("{}/repos/{}/{}", GITHUB_API, slug.owner, slug.repo);
    let repo = match client.get_json_opt(&url, token)? {
        Some(repo) => repo,
        None => return Ok(None),
    };
    repo.get("default_branch")
        .and_then(Value::as_str)
        .map(|branch| Some(branch.to_string()))
        .ok_or_else(|| {
            Error::MetadataUnavailable(format!("{} has no default branch metadata", slug.slug()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slug() {
        let slug = GithubSlug::parse("tidyverse/ggplot2").unwrap();
        assert_eq!(slug.owner, "tidyverse");
        assert_eq!(slug.repo, "ggplot2");
        assert_eq!(slug.git_ref, None);
    }

    #[test]
    fn test_parse_slug_with_ref() {
        let slug = GithubSlug::parse("r-lib/rlang@v1.1.3").unwrap();
        assert_eq!(slug.owner, "r-lib");
        assert_eq!(slug.repo, "rlang");
        assert_eq!(slug.git_ref.as_deref(), Some("v1.1.3"));
    }

    #[test]
    fn test_parse_slug_rejects_bare_name() {
        assert!(GithubSlug::parse("ggplot2").is_err());
        assert!(GithubSlug::parse("/repo").is_err());
        assert!(GithubSlug::parse("owner/").is_err());
    }
}
