pub mod client;

use crate::error::{AnalyzerError, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A GitHub repository identified by owner and name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubRepo {
    pub owner: String,
    pub repo: String,
}

impl GitHubRepo {
    /// Parse a repository from `owner/name` or a GitHub remote URL
    ///
    /// Accepted forms:
    /// - owner/name
    /// - https://github.com/owner/name(.git)
    /// - git@github.com:owner/name.git
    /// - git://github.com/owner/name.git
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        parse_github_url(input)
            .or_else(|| parse_full_name(input))
            .ok_or_else(|| AnalyzerError::InvalidRepoName(input.to_string()))
    }

    /// Full name in `owner/name` form, the key used by the store
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Store key for user input: the full name when the input parses,
    /// otherwise the trimmed input itself
    pub fn normalize(input: &str) -> String {
        match Self::parse(input) {
            Ok(parsed) => parsed.full_name(),
            Err(_) => input.trim().to_string(),
        }
    }

    /// Path of the issues listing relative to the API base URL
    pub fn issues_path(&self) -> String {
        format!("/repos/{}/{}/issues", self.owner, self.repo)
    }
}

impl fmt::Display for GitHubRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// An issue as normalized from the GitHub issues listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedIssue {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub html_url: String,
    pub created_at: DateTime<Utc>,
}

fn parse_full_name(input: &str) -> Option<GitHubRepo> {
    let captures = Regex::new(r"^([A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)/([A-Za-z0-9._-]+)$")
        .ok()?
        .captures(input)?;

    let repo = captures.get(2)?.as_str();
    if repo == "." || repo == ".." {
        return None;
    }

    Some(GitHubRepo {
        owner: captures.get(1)?.as_str().to_string(),
        repo: repo.to_string(),
    })
}

/// Parse GitHub repository information from a remote URL
fn parse_github_url(url: &str) -> Option<GitHubRepo> {
    let patterns = [
        r"^https://github\.com/([^/]+)/([^/]+?)(?:\.git)?/?$",
        r"^git@github\.com:([^/]+)/([^/]+?)(?:\.git)?$",
        r"^git://github\.com/([^/]+)/([^/]+?)(?:\.git)?$",
    ];

    for pattern in patterns {
        if let Some(captures) = Regex::new(pattern).ok()?.captures(url) {
            return Some(GitHubRepo {
                owner: captures.get(1)?.as_str().to_string(),
                repo: captures.get(2)?.as_str().to_string(),
            });
        }
    }

    None
}
