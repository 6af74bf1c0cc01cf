use crate::store::IssueRecord;

/// System message for every analysis call
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant for analyzing GitHub issues.";

/// Issue bodies longer than this many characters are cut off
pub const MAX_BODY_CHARS: usize = 500;

/// Truncate an issue body to `MAX_BODY_CHARS` characters, marking the cut
pub fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

/// Render one issue for inclusion in a prompt
pub fn format_issue(issue: &IssueRecord) -> String {
    format!(
        "Issue #{}\nTitle: {}\nBody: {}\nURL: {}\nCreated At: {}\n---\n",
        issue.id,
        issue.title,
        truncate_body(&issue.body),
        issue.html_url,
        issue.created_at.format("%Y-%m-%d %H:%M:%S"),
    )
}

/// User message for one batch of issues
pub fn batch_prompt(prompt: &str, issues: &[IssueRecord]) -> String {
    let formatted: String = issues.iter().map(format_issue).collect();
    format!("{}\n\nHere are the recent issues:\n{}", prompt, formatted)
}

/// User message asking to merge the per-batch analyses
pub fn synthesis_prompt(prompt: &str, batch_results: &[String]) -> String {
    format!(
        "{}\n\nHere are analyses of different batches of issues:\n{}\n\n\
         Please provide an overall summary and recommendations based on all the above analyses.",
        prompt,
        batch_results.join("\n\n")
    )
}
