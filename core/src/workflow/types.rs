use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agents::{AgentScope, AgentSource};
use crate::config::{
    AppConfig, MAX_CONCURRENCY_CEILING, MAX_TASKS_PER_WAVE_CEILING, MAX_WAVES_CEILING,
    MAX_WORKER_ATTEMPTS_CEILING,
};
use crate::report::CriticDecision;
use crate::usage::UsageSummary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    pub id: String,
    pub objective: String,
    pub acceptance_criteria: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub tasks: Vec<TaskSpec>,
}

impl WaveSpec {
    /// The wave's trimmed name, or "Wave N" (1-based) when absent or blank.
    pub fn display_name(&self, index: usize) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Wave {}", index + 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowPlan {
    pub goal: String,
    pub waves: Vec<WaveSpec>,
}

impl WorkflowPlan {
    pub fn total_tasks(&self) -> usize {
        self.waves.iter().map(|w| w.tasks.len()).sum()
    }
}

/// Knobs for one workflow run, seeded from [`AppConfig`] and overridable per call.
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    pub worker_agent: String,
    pub critic_agent: String,
    pub max_concurrency: usize,
    pub max_worker_attempts: u32,
    pub fail_fast: bool,
    pub agent_scope: AgentScope,
    pub confirm_project_agents: bool,
    /// Skip the interactive execution approval gate.
    pub execution_approved: bool,
    pub max_tasks: usize,
    pub critic_output_limit: usize,
}

impl WorkflowOptions {
    pub fn from_config(cfg: &AppConfig) -> Self {
        let wf = &cfg.workflow;
        Self {
            worker_agent: wf.worker_agent.clone(),
            critic_agent: wf.critic_agent.clone(),
            max_concurrency: wf.max_concurrency,
            max_worker_attempts: wf.max_worker_attempts,
            fail_fast: wf.fail_fast,
            agent_scope: wf.agent_scope,
            confirm_project_agents: wf.confirm_project_agents,
            execution_approved: false,
            max_tasks: wf.max_tasks,
            critic_output_limit: wf.critic_output_limit,
        }
    }

    /// Clamp numeric knobs into their supported ranges.
    pub fn clamped(mut self) -> Self {
        self.max_concurrency = self.max_concurrency.clamp(1, MAX_CONCURRENCY_CEILING);
        self.max_worker_attempts = self
            .max_worker_attempts
            .clamp(1, MAX_WORKER_ATTEMPTS_CEILING);
        self
    }
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

#[derive(Debug, Clone)]
pub struct PlanningOptions {
    pub planner_agent: String,
    pub context: Vec<String>,
    pub constraints: Vec<String>,
    pub max_waves: usize,
    pub max_tasks_per_wave: usize,
    pub planning_attempts: u32,
}

impl PlanningOptions {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            planner_agent: cfg.planner.planner_agent.clone(),
            context: Vec::new(),
            constraints: Vec::new(),
            max_waves: cfg.planner.max_waves,
            max_tasks_per_wave: cfg.planner.max_tasks_per_wave,
            planning_attempts: cfg.planner.planning_attempts,
        }
    }

    pub fn clamped(mut self) -> Self {
        self.max_waves = self.max_waves.clamp(1, MAX_WAVES_CEILING);
        self.max_tasks_per_wave = self.max_tasks_per_wave.clamp(1, MAX_TASKS_PER_WAVE_CEILING);
        self.planning_attempts = self.planning_attempts.clamp(1, 3);
        self
    }
}

impl Default for PlanningOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    RunningWorker,
    RunningCritic,
    Completed,
    Blocked,
    Failed,
    Skipped,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::RunningWorker => "running-worker",
            TaskStatus::RunningCritic => "running-critic",
            TaskStatus::Completed => "completed",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Failed => "failed",
            TaskStatus::Skipped => "skipped",
        }
    }

    pub fn is_running(self) -> bool {
        matches!(self, TaskStatus::RunningWorker | TaskStatus::RunningCritic)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Blocked | TaskStatus::Failed | TaskStatus::Skipped
        )
    }

    /// Failed or blocked: the statuses that trip fail-fast and mark a run as an error.
    pub fn is_failure(self) -> bool {
        matches!(self, TaskStatus::Failed | TaskStatus::Blocked)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable execution record for one task. Owned by exactly one execution path at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRuntime {
    pub id: String,
    pub objective: String,
    pub wave_index: usize,
    pub wave_name: String,
    pub status: TaskStatus,
    pub attempt: u32,
    pub cwd: PathBuf,
    pub files: Vec<String>,
    pub acceptance_criteria: Vec<String>,
    pub constraints: Vec<String>,
    pub context: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_summary: Option<String>,
    pub files_touched: Vec<String>,
    pub blockers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critic_decision: Option<CriticDecision>,
    pub issues: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub usage: UsageSummary,
    pub tool_calls: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_agent_source: Option<AgentSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critic_agent_source: Option<AgentSource>,
}

impl TaskRuntime {
    pub fn new(spec: &TaskSpec, wave_index: usize, wave_name: String, cwd: PathBuf) -> Self {
        Self {
            id: spec.id.clone(),
            objective: spec.objective.clone(),
            wave_index,
            wave_name,
            status: TaskStatus::Pending,
            attempt: 0,
            cwd,
            files: spec.files.clone(),
            acceptance_criteria: spec.acceptance_criteria.clone(),
            constraints: spec.constraints.clone(),
            context: spec.context.clone(),
            worker_summary: None,
            files_touched: Vec::new(),
            blockers: Vec::new(),
            critic_decision: None,
            issues: Vec::new(),
            error: None,
            usage: UsageSummary::default(),
            tool_calls: 0,
            worker_agent_source: None,
            critic_agent_source: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub completed: usize,
    pub blocked: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl StatusCounts {
    pub fn from_tasks(tasks: &[TaskRuntime]) -> Self {
        tasks.iter().fold(Self::default(), |mut acc, task| {
            match task.status {
                TaskStatus::Completed => acc.completed += 1,
                TaskStatus::Blocked => acc.blocked += 1,
                TaskStatus::Failed => acc.failed += 1,
                TaskStatus::Skipped => acc.skipped += 1,
                _ => {}
            }
            acc
        })
    }

    pub fn has_errors(&self) -> bool {
        self.failed > 0 || self.blocked > 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningDetails {
    pub planner_agent: String,
    pub attempts: u32,
    pub usage: UsageSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDetails {
    pub run_id: String,
    pub goal: String,
    pub worker_agent: String,
    pub critic_agent: String,
    pub agent_scope: AgentScope,
    pub max_worker_attempts: u32,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub tasks: Vec<TaskRuntime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planning: Option<PlanningDetails>,
}

impl WorkflowDetails {
    pub fn counts(&self) -> StatusCounts {
        StatusCounts::from_tasks(&self.tasks)
    }

    /// Usage folded over every task record.
    pub fn usage(&self) -> UsageSummary {
        self.tasks.iter().map(|t| &t.usage).sum()
    }
}

/// Final, structured result of a workflow call. Workflow entry points never return `Err`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowOutcome {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<WorkflowDetails>,
    pub is_error: bool,
    pub cancelled: bool,
}

impl WorkflowOutcome {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            details: None,
            is_error: true,
            cancelled: false,
        }
    }

    pub fn cancelled(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            details: None,
            is_error: true,
            cancelled: true,
        }
    }
}
