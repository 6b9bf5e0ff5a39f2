use async_trait::async_trait;

use crate::agents::{AgentConfig, AgentDiscovery, AgentScope, AgentSource};

use super::types::WorkflowPlan;

pub const PROJECT_AGENTS_DECLINED: &str = "Cancelled by user: project-local agents not approved.";
pub const EXECUTION_APPROVAL_REQUIRED: &str =
    "Execution approval required. Re-run with executionApproved=true for non-interactive mode.";
pub const EXECUTION_DECLINED: &str = "Execution cancelled: plan not approved by user.";

/// Yes/no confirmation collaborator supplied by the caller.
#[async_trait]
pub trait ApprovalUi: Send + Sync {
    fn has_ui(&self) -> bool;
    async fn confirm(&self, title: &str, detail: &str) -> bool;
}

/// No interactive surface: every gate that needs a human declines.
pub struct NonInteractive;

#[async_trait]
impl ApprovalUi for NonInteractive {
    fn has_ui(&self) -> bool {
        false
    }

    async fn confirm(&self, _title: &str, _detail: &str) -> bool {
        false
    }
}

/// Approves everything it is asked.
pub struct AutoApprove;

#[async_trait]
impl ApprovalUi for AutoApprove {
    fn has_ui(&self) -> bool {
        true
    }

    async fn confirm(&self, _title: &str, _detail: &str) -> bool {
        true
    }
}

/// Ask before running agents defined inside the project tree. Returns `true` when the
/// run may proceed.
pub async fn confirm_project_agents_if_needed(
    ui: &dyn ApprovalUi,
    scope: AgentScope,
    should_confirm: bool,
    discovery: &AgentDiscovery,
    agents: &[&AgentConfig],
) -> bool {
    if !ui.has_ui() || !should_confirm || !scope.includes_project() {
        return true;
    }

    let project_agents: Vec<&&AgentConfig> = agents
        .iter()
        .filter(|agent| agent.source == AgentSource::Project)
        .collect();
    if project_agents.is_empty() {
        return true;
    }

    let names = project_agents
        .iter()
        .map(|agent| format!("{} ({})", agent.name, agent.source))
        .collect::<Vec<_>>()
        .join(", ");
    let dir = discovery
        .project_agents_dir
        .as_ref()
        .map(|d| d.display().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    ui.confirm(
        "Approve project-local agents?",
        &format!("Agents: {names}\nsource dir: {dir}"),
    )
    .await
}

/// One line per wave: name, task count and up to four task ids.
pub fn format_wave_summary(plan: &WorkflowPlan) -> String {
    plan.waves
        .iter()
        .enumerate()
        .map(|(index, wave)| {
            let preview = wave
                .tasks
                .iter()
                .take(4)
                .map(|t| t.id.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let overflow = if wave.tasks.len() > 4 {
                format!(" +{} more", wave.tasks.len() - 4)
            } else {
                String::new()
            };
            let ids = if preview.is_empty() {
                String::new()
            } else {
                format!(" [{preview}{overflow}]")
            };
            format!("{}: {} task(s){ids}", wave.display_name(index), wave.tasks.len())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Gate before any process is spawned. `Err` carries the message for the cancelled outcome.
pub async fn require_execution_approval(
    ui: &dyn ApprovalUi,
    plan: &WorkflowPlan,
    execution_approved: bool,
) -> Result<(), &'static str> {
    if execution_approved {
        return Ok(());
    }
    if !ui.has_ui() {
        return Err(EXECUTION_APPROVAL_REQUIRED);
    }

    let detail = format!("Goal: {}\n\n{}", plan.goal, format_wave_summary(plan));
    if ui.confirm("Approve workflow execution?", &detail).await {
        Ok(())
    } else {
        Err(EXECUTION_DECLINED)
    }
}
