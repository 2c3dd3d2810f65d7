//! Repository URL parsing
//!
//! Supports:
//! - GitHub: https://github.com/owner/repo[.git][/tree/branch]
//! - GitLab: https://gitlab.com/owner/repo[.git][/-/tree/branch]
//!
//! Branch names may contain `/`. GitLab subgroups (`group/sub/repo`) are not
//! supported; the owner is always a single path segment.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ProjiError, Result};

/// Branch used when the URL does not name one
pub const DEFAULT_BRANCH: &str = "master";

static REPO_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?:https?://)?(?:www\.)?(?P<host>github\.com|gitlab\.com)/(?P<owner>[^/\s]+)/(?P<repo>[^/\s]+?)(?:\.git)?(?:/(?:-/)?tree/(?P<branch>\S+?))?/?$"#,
    )
    .expect("Invalid REPO_URL_REGEX pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Host {
    GitHub,
    GitLab,
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::GitHub => write!(f, "github.com"),
            Host::GitLab => write!(f, "gitlab.com"),
        }
    }
}

/// The host, owner, repository and branch a tree is fetched from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoSource {
    pub host: Host,
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl RepoSource {
    pub fn new(host: Host, owner: &str, repo: &str, branch: Option<&str>) -> Result<Self> {
        let owner = owner.trim();
        let repo = repo.trim();
        if owner.is_empty() || repo.is_empty() {
            return Err(ProjiError::InvalidIdentifier(format!(
                "could not extract owner and repository name from {host}/{owner}/{repo}"
            )));
        }

        let branch = branch
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .unwrap_or(DEFAULT_BRANCH);

        Ok(Self {
            host,
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: branch.to_string(),
        })
    }

    /// Parse a repository URL
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        let caps = REPO_URL_REGEX.captures(url).ok_or_else(|| {
            ProjiError::InvalidIdentifier(format!("could not parse repository URL: {url}"))
        })?;

        let host = match &caps["host"] {
            "github.com" => Host::GitHub,
            _ => Host::GitLab,
        };

        Self::new(
            host,
            &caps["owner"],
            &caps["repo"],
            caps.name("branch").map(|m| m.as_str()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_github() {
        let source = RepoSource::parse("https://github.com/nikoksr/proji").unwrap();
        assert_eq!(source.host, Host::GitHub);
        assert_eq!(source.owner, "nikoksr");
        assert_eq!(source.repo, "proji");
        assert_eq!(source.branch, DEFAULT_BRANCH);
    }

    #[test]
    fn test_parse_github_branch_and_git_suffix() {
        let source = RepoSource::parse("https://github.com/owner/repo.git").unwrap();
        assert_eq!(source.repo, "repo");

        let source = RepoSource::parse("https://github.com/owner/repo/tree/develop").unwrap();
        assert_eq!(source.branch, "develop");
    }

    #[test]
    fn test_parse_branch_with_slashes() {
        let source = RepoSource::parse("https://github.com/owner/repo/tree/feature/x").unwrap();
        assert_eq!(source.repo, "repo");
        assert_eq!(source.branch, "feature/x");

        let source =
            RepoSource::parse("https://gitlab.com/group/project/-/tree/release/1.2/").unwrap();
        assert_eq!(source.branch, "release/1.2");
    }

    #[test]
    fn test_parse_gitlab_with_branch() {
        let source = RepoSource::parse("https://gitlab.com/inkscape/inkscape/-/tree/1.0.x").unwrap();
        assert_eq!(source.host, Host::GitLab);
        assert_eq!(source.owner, "inkscape");
        assert_eq!(source.repo, "inkscape");
        assert_eq!(source.branch, "1.0.x");
    }

    #[test]
    fn test_parse_without_scheme() {
        let source = RepoSource::parse("gitlab.com/inkscape/inkscape/").unwrap();
        assert_eq!(source.host, Host::GitLab);
        assert_eq!(source.branch, DEFAULT_BRANCH);
    }

    #[test]
    fn test_parse_rejects_unusable_urls() {
        for url in [
            "https://github.com/owner-only",
            "https://bitbucket.org/owner/repo",
            "not a url",
            "",
        ] {
            let err = RepoSource::parse(url).unwrap_err();
            assert!(
                matches!(err, ProjiError::InvalidIdentifier(_)),
                "{url} gave {err}"
            );
        }
    }

    #[test]
    fn test_new_rejects_empty_owner() {
        let err = RepoSource::new(Host::GitHub, " ", "repo", None).unwrap_err();
        assert!(matches!(err, ProjiError::InvalidIdentifier(_)));
    }
}
