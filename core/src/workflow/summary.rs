use crate::usage::UsageSummary;

use super::types::StatusCounts;

/// Leading line of the result text when the run token was cancelled mid-run.
pub const WORKFLOW_CANCELLED: &str = "Workflow cancelled before all tasks could finish.";

pub fn result_text(counts: &StatusCounts, usage: &UsageSummary) -> String {
    format!(
        "Workflow finished: {} completed, {} blocked, {} failed, {} skipped\nUsage: {}",
        counts.completed,
        counts.blocked,
        counts.failed,
        counts.skipped,
        usage.summary_text()
    )
}
