use thiserror::Error;

/// Main error type for issue-analyzer
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// The repository does not exist upstream
    #[error("Repository not found: {0}")]
    RepoNotFound(String),

    /// Upstream answered with a non-success status other than 404
    #[error("GitHub API error: {status}")]
    UpstreamError { status: u16 },

    /// Analyze was requested before the repository was scanned
    #[error("Repository not found in cache. Please scan first.")]
    RepoNotCached(String),

    /// The repository was scanned but holds no issues
    #[error("No issues found for this repository.")]
    NoIssuesCached(String),

    /// Input that cannot be read as a GitHub repository
    #[error("Invalid repository name: {0}")]
    InvalidRepoName(String),

    /// LLM completion API errors
    #[error("LLM API error: {0}")]
    Llm(String),

    /// Upstream timestamp not in the expected format
    #[error("Timestamp parse error: {0}")]
    Timestamp(#[from] chrono::ParseError),

    /// HTTP/API errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Issue store errors
    #[error("Store error: {0}")]
    Store(#[from] sled::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking store work panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parsing errors
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Missing configuration
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),
}

/// Result type alias for issue-analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;

impl AnalyzerError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new LLM API error
    pub fn llm<S: Into<String>>(msg: S) -> Self {
        Self::Llm(msg.into())
    }

    /// Whether the error is attributable to the caller's input or the
    /// upstream repository rather than to this service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::RepoNotFound(_) | Self::UpstreamError { .. } | Self::InvalidRepoName(_)
        )
    }
}
