use crate::error::{AnalyzerError, Result};
use crate::github::{FetchedIssue, GitHubRepo};
use chrono::NaiveDateTime;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const CREATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Unauthenticated client for the GitHub issues listing
pub struct GitHubClient {
    client: Client,
    base_url: String,
}

impl GitHubClient {
    /// Create a new GitHub client against the given API base URL
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("issue-analyzer/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the open issues of a repository, pull requests excluded
    pub async fn fetch_open_issues(&self, repo: &GitHubRepo) -> Result<Vec<FetchedIssue>> {
        let url = format!("{}{}", self.base_url, repo.issues_path());
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", GITHUB_ACCEPT)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::error!("Repository not found: {}", repo);
            return Err(AnalyzerError::RepoNotFound(repo.full_name()));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Failed to fetch issues: {} {}", status, error_text);
            return Err(AnalyzerError::UpstreamError {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        parse_issues(&bytes)
    }
}

/// Entry of the GitHub issues listing; issues and pull requests share it
#[derive(Debug, Deserialize)]
struct RawIssue {
    id: u64,
    title: Option<String>,
    body: Option<String>,
    html_url: Option<String>,
    created_at: String,
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

impl RawIssue {
    fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }

    fn normalize(self) -> Result<FetchedIssue> {
        let created_at = NaiveDateTime::parse_from_str(&self.created_at, CREATED_AT_FORMAT)?;

        Ok(FetchedIssue {
            id: self.id,
            title: self.title.unwrap_or_default(),
            body: self.body.unwrap_or_default(),
            html_url: self.html_url.unwrap_or_default(),
            created_at: created_at.and_utc(),
        })
    }
}

/// Parse an issues listing payload, dropping pull requests
fn parse_issues(payload: &[u8]) -> Result<Vec<FetchedIssue>> {
    let raw: Vec<RawIssue> = serde_json::from_slice(payload)?;

    raw.into_iter()
        .filter(|issue| !issue.is_pull_request())
        .map(RawIssue::normalize)
        .collect()
}
