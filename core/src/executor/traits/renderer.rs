use crate::events::WorkflowEvent;
use crate::workflow::WorkflowOutcome;

/// Output renderer plugin (controls the output format).
pub trait OutputRendererPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn format(&self) -> &str;
    fn render(&self, event: &WorkflowEvent);
    /// Final result. `expanded` asks for every task record rather than a short table.
    fn render_outcome(&self, outcome: &WorkflowOutcome, expanded: bool);
}
