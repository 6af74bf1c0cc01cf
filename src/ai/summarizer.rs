use crate::ai::prompt::{batch_prompt, synthesis_prompt, SYSTEM_PROMPT};
use crate::ai::{Analysis, AnalysisStatus, BatchOutcome, CompletionClient};
use crate::store::IssueRecord;
use std::sync::Arc;

/// Issues sent to the LLM per call
pub const BATCH_SIZE: usize = 20;

/// Analyzes issues in fixed-size batches, then merges the batch results
pub struct Summarizer {
    client: Arc<dyn CompletionClient>,
    batch_size: usize,
}

impl Summarizer {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            batch_size: BATCH_SIZE,
        }
    }

    /// Analyze `issues` against `prompt`
    ///
    /// One call per batch, in order. With more than one batch a final call
    /// merges the batch results. LLM failures never abort the run; they are
    /// reflected in the returned status.
    pub async fn summarize(&self, repo: &str, prompt: &str, issues: &[IssueRecord]) -> Analysis {
        let mut outcomes = Vec::new();
        for (index, batch) in issues.chunks(self.batch_size).enumerate() {
            tracing::info!(
                "Analyzing batch {} ({} issues) for {}",
                index + 1,
                batch.len(),
                repo
            );
            outcomes.push(self.call(&batch_prompt(prompt, batch)).await);
        }

        let batches = outcomes.len();
        let failed_batches = outcomes.iter().filter(|o| o.is_failed()).count();

        let final_outcome = match outcomes.len() {
            0 => BatchOutcome::Failed("no issues to analyze".to_string()),
            1 => outcomes.remove(0),
            _ => {
                let batch_results: Vec<String> = outcomes
                    .iter()
                    .enumerate()
                    .map(|(index, outcome)| match outcome {
                        BatchOutcome::Completed(text) => text.clone(),
                        BatchOutcome::Failed(_) => {
                            format!("Batch {}: analysis unavailable.", index + 1)
                        }
                    })
                    .collect();
                tracing::info!("Merging {} batch analyses for {}", batches, repo);
                self.call(&synthesis_prompt(prompt, &batch_results)).await
            }
        };

        let (text, status) = match final_outcome {
            BatchOutcome::Completed(text) if failed_batches == 0 => (text, AnalysisStatus::Complete),
            BatchOutcome::Completed(text) => (text, AnalysisStatus::Degraded { failed_batches }),
            BatchOutcome::Failed(reason) => (String::new(), AnalysisStatus::Unavailable { reason }),
        };

        Analysis {
            repo: repo.to_string(),
            text,
            batches,
            status,
        }
    }

    async fn call(&self, user: &str) -> BatchOutcome {
        match self.client.complete(SYSTEM_PROMPT, user).await {
            Ok(text) => {
                tracing::info!("Received analysis from LLM.");
                BatchOutcome::Completed(text)
            }
            Err(e) => {
                tracing::error!("LLM API error: {}", e);
                BatchOutcome::Failed(e.to_string())
            }
        }
    }
}
