pub mod openai;
pub mod prompt;
pub mod summarizer;

use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;

/// A chat completion backend: one system and one user message in, text out
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Result of a single LLM call
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    Completed(String),
    Failed(String),
}

impl BatchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, BatchOutcome::Failed(_))
    }
}

/// How complete a final analysis is
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Every call succeeded
    Complete,
    /// Final text produced, but some batches could not be analyzed
    Degraded { failed_batches: usize },
    /// No final text could be produced
    Unavailable { reason: String },
}

/// LLM-generated analysis of a repository's cached issues
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    /// Repository name
    pub repo: String,
    /// Final analysis text (empty when unavailable)
    pub text: String,
    /// Number of per-batch LLM calls made
    pub batches: usize,
    pub status: AnalysisStatus,
}

impl Analysis {
    /// Batches whose LLM call failed
    pub fn failed_batches(&self) -> usize {
        match &self.status {
            AnalysisStatus::Complete => 0,
            AnalysisStatus::Degraded { failed_batches } => *failed_batches,
            AnalysisStatus::Unavailable { .. } => self.batches,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.status, AnalysisStatus::Unavailable { .. })
    }

    /// Format analysis as markdown
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# {}\n\n", self.repo));
        match &self.status {
            AnalysisStatus::Unavailable { reason } => {
                output.push_str(&format!("Analysis unavailable: {}\n", reason));
            }
            status => {
                output.push_str(&self.text);
                output.push('\n');
                if let AnalysisStatus::Degraded { failed_batches } = status {
                    output.push_str(&format!(
                        "\n*{} of {} batches could not be analyzed*\n",
                        failed_batches, self.batches
                    ));
                }
            }
        }

        output
    }
}
