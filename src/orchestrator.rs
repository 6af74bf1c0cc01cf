use crate::ai::openai::OpenAIClient;
use crate::ai::summarizer::Summarizer;
use crate::ai::{Analysis, CompletionClient};
use crate::config::Config;
use crate::error::{AnalyzerError, Result};
use crate::github::client::GitHubClient;
use crate::github::GitHubRepo;
use crate::store::{IssueStore, ScanOutcome};
use std::sync::Arc;

/// Orchestrator for the scan and analyze operations
pub struct Orchestrator {
    github: GitHubClient,
    store: Arc<IssueStore>,
    summarizer: Summarizer,
}

impl Orchestrator {
    /// Create an orchestrator from explicit collaborators
    pub fn new(github: GitHubClient, store: IssueStore, llm: Arc<dyn CompletionClient>) -> Self {
        Self {
            github,
            store: Arc::new(store),
            summarizer: Summarizer::new(llm),
        }
    }

    /// Build every collaborator from configuration
    ///
    /// A missing OpenAI key does not stop scanning; analysis reports it instead.
    pub fn from_config(config: &Config) -> Result<Self> {
        let github = GitHubClient::new(&config.github_api_url)?;
        let store = IssueStore::open(&config.data_dir()?)?;
        let api_key = match config.get_api_key() {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!("{}; analysis is unavailable until a key is set", e);
                None
            }
        };
        let llm = OpenAIClient::new(
            api_key,
            &config.openai_base_url,
            config.openai_model.clone(),
        )?;

        Ok(Self::new(github, store, Arc::new(llm)))
    }

    /// Get a reference to the issue store
    pub fn store(&self) -> &IssueStore {
        &self.store
    }

    /// Fetch the open issues of a repository and replace its cached set
    pub async fn scan(&self, repo: &str) -> Result<ScanOutcome> {
        let repo = GitHubRepo::parse(repo)?;
        let issues = self.github.fetch_open_issues(&repo).await?;

        let store = Arc::clone(&self.store);
        let name = repo.full_name();
        let outcome =
            tokio::task::spawn_blocking(move || store.replace_issues(&name, &issues)).await??;
        tracing::info!(
            "Fetched and cached {} issues for {}",
            outcome.issues_fetched,
            outcome.repo
        );

        Ok(outcome)
    }

    /// Answer `prompt` about the cached issues of a repository
    pub async fn analyze(&self, repo: &str, prompt: &str) -> Result<Analysis> {
        let name = GitHubRepo::normalize(repo);

        let Some(record) = self.store.find_repo(&name)? else {
            tracing::error!("Repo not found in cache: {}", name);
            return Err(AnalyzerError::RepoNotCached(name));
        };

        let issues = self.store.issues_for(record.id)?;
        if issues.is_empty() {
            tracing::warn!("No issues found for repo: {}", name);
            return Err(AnalyzerError::NoIssuesCached(name));
        }

        Ok(self.summarizer.summarize(&name, prompt, &issues).await)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ai::summarizer::tests::FakeClient;
    use crate::ai::AnalysisStatus;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn issue_payload(ids: std::ops::Range<u64>) -> Vec<serde_json::Value> {
        ids.map(|id| {
            json!({
                "id": id,
                "title": format!("Issue {}", id),
                "body": "Something broke",
                "html_url": format!("https://github.com/octocat/Hello-World/issues/{}", id),
                "created_at": "2024-02-03T04:05:06Z"
            })
        })
        .collect()
    }

    pub(crate) async fn mount_issues(server: &MockServer, repo: &str, payload: Vec<serde_json::Value>) {
        Mock::given(method("GET"))
            .and(path(format!("/repos/{}/issues", repo)))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload))
            .mount(server)
            .await;
    }

    pub(crate) fn orchestrator(
        server: &MockServer,
        temp_dir: &TempDir,
        llm: Arc<FakeClient>,
    ) -> Orchestrator {
        let github = GitHubClient::new(&server.uri()).unwrap();
        let store = IssueStore::open(temp_dir.path()).unwrap();
        Orchestrator::new(github, store, llm)
    }

    #[tokio::test]
    async fn test_scan_excludes_pull_requests() {
        let server = MockServer::start().await;
        let mut payload = issue_payload(1..4);
        payload.push(json!({
            "id": 4,
            "title": "Add feature",
            "created_at": "2024-02-03T04:05:06Z",
            "pull_request": { "url": "https://api.github.com/repos/octocat/Hello-World/pulls/4" }
        }));
        mount_issues(&server, "octocat/Hello-World", payload).await;

        let temp_dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(&server, &temp_dir, Arc::new(FakeClient::default()));

        let outcome = orchestrator.scan("octocat/Hello-World").await.unwrap();
        assert_eq!(
            outcome,
            ScanOutcome {
                repo: "octocat/Hello-World".to_string(),
                issues_fetched: 3,
                cached_successfully: true,
            }
        );

        let record = orchestrator.store().find_repo("octocat/Hello-World").unwrap().unwrap();
        assert_eq!(record.issues_fetched, 3);
        assert_eq!(orchestrator.store().issues_for(record.id).unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_scan_from_config_without_api_key() {
        let server = MockServer::start().await;
        mount_issues(&server, "octocat/Hello-World", issue_payload(1..3)).await;

        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            github_api_url: server.uri(),
            data_dir: Some(temp_dir.path().to_path_buf()),
            ..Config::default()
        };
        assert!(config.openai_api_key.is_empty());

        let orchestrator = Orchestrator::from_config(&config).unwrap();
        let outcome = orchestrator.scan("octocat/Hello-World").await.unwrap();
        assert_eq!(outcome.issues_fetched, 2);
        assert!(outcome.cached_successfully);
    }

    #[tokio::test]
    async fn test_scan_not_found_creates_no_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/ghost/none/issues"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(&server, &temp_dir, Arc::new(FakeClient::default()));

        let result = orchestrator.scan("ghost/none").await;
        assert!(matches!(result, Err(AnalyzerError::RepoNotFound(_))));
        assert!(orchestrator.store().find_repo("ghost/none").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_scan_normalizes_url_input() {
        let server = MockServer::start().await;
        mount_issues(&server, "octocat/Hello-World", issue_payload(1..3)).await;

        let temp_dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(&server, &temp_dir, Arc::new(FakeClient::default()));

        let outcome = orchestrator
            .scan("https://github.com/octocat/Hello-World.git")
            .await
            .unwrap();
        assert_eq!(outcome.repo, "octocat/Hello-World");
        assert!(orchestrator.store().find_repo("octocat/Hello-World").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_analyze_never_scanned() {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        let llm = Arc::new(FakeClient::default());
        let orchestrator = orchestrator(&server, &temp_dir, llm.clone());

        let result = orchestrator.analyze("octocat/Hello-World", "Themes?").await;
        assert!(matches!(result, Err(AnalyzerError::RepoNotCached(_))));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_analyze_without_issues() {
        let server = MockServer::start().await;
        mount_issues(&server, "octocat/empty", vec![]).await;

        let temp_dir = TempDir::new().unwrap();
        let llm = Arc::new(FakeClient::default());
        let orchestrator = orchestrator(&server, &temp_dir, llm.clone());

        orchestrator.scan("octocat/empty").await.unwrap();
        let result = orchestrator.analyze("octocat/empty", "Themes?").await;
        assert!(matches!(result, Err(AnalyzerError::NoIssuesCached(_))));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_analyze_45_issues_makes_four_calls() {
        let server = MockServer::start().await;
        mount_issues(&server, "octocat/Hello-World", issue_payload(0..45)).await;

        let temp_dir = TempDir::new().unwrap();
        let llm = Arc::new(FakeClient::default());
        let orchestrator = orchestrator(&server, &temp_dir, llm.clone());

        orchestrator.scan("octocat/Hello-World").await.unwrap();
        let analysis = orchestrator
            .analyze("octocat/Hello-World", "What are common themes?")
            .await
            .unwrap();

        assert_eq!(llm.call_count(), 4);
        assert_eq!(analysis.batches, 3);
        assert_eq!(analysis.repo, "octocat/Hello-World");
        assert_eq!(analysis.status, AnalysisStatus::Complete);
    }

    #[tokio::test]
    async fn test_rescan_replaces_analyzed_issues() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/Hello-World/issues"))
            .respond_with(ResponseTemplate::new(200).set_body_json(issue_payload(1..3)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        mount_issues(&server, "octocat/Hello-World", issue_payload(100..101)).await;

        let temp_dir = TempDir::new().unwrap();
        let llm = Arc::new(FakeClient::default());
        let orchestrator = orchestrator(&server, &temp_dir, llm.clone());

        assert_eq!(orchestrator.scan("octocat/Hello-World").await.unwrap().issues_fetched, 2);
        assert_eq!(orchestrator.scan("octocat/Hello-World").await.unwrap().issues_fetched, 1);

        orchestrator.analyze("octocat/Hello-World", "Themes?").await.unwrap();
        let calls = llm.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains("Issue #100\n"));
        assert!(!calls[0].contains("Issue #1\n"));
    }
}
