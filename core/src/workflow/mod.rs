mod approval;
mod engine;
mod planning;
mod prompts;
mod summary;
mod task;
mod types;
mod validate;

pub use approval::{
    confirm_project_agents_if_needed, format_wave_summary, require_execution_approval,
    ApprovalUi, AutoApprove, NonInteractive, EXECUTION_APPROVAL_REQUIRED, EXECUTION_DECLINED,
    PROJECT_AGENTS_DECLINED,
};
pub use engine::WorkflowEngine;
pub use planning::{PlanRequest, PLANNER_FAILED};
pub use prompts::{build_critic_prompt, build_planner_prompt, build_worker_prompt};
pub use summary::{result_text, WORKFLOW_CANCELLED};
pub use types::*;
pub use validate::{parse_plan_json, preflight, resolve_task_cwd, validate_goal, validate_plan};
