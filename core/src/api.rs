//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `wavecrew_core::api` instead of reaching into internal modules.

pub use crate::agents::{
    list_agent_names, lookup, merge_scoped, AgentConfig, AgentDiscoverer, AgentDiscovery,
    AgentScope, AgentSource,
};
pub use crate::config::{
    load_default, load_from_path, AgentsConfig, AppConfig, ControlConfig, LoggingConfig,
    PlannerConfig, RunnerConfig, WorkflowConfig,
};
pub use crate::error::{CliError, PlanError, RunnerError, WorkflowError};
pub use crate::events::{EventsTx, WorkflowEvent};
pub use crate::executor::{map_with_concurrency, OutputRendererPlugin};
pub use crate::report::{CriticDecision, CriticReport, WorkerReport, WorkerStatus};
pub use crate::runner::{
    AgentInvocation, AgentProgress, AgentRunResult, AgentSupervisor, ProgressPhase, RunOutcome,
    RunnerPlugin, RunnerSession, RunnerStartArgs, Signal, CANCELLED_EXIT_CODE,
};
pub use crate::usage::UsageSummary;
pub use crate::workflow::{
    parse_plan_json, result_text, validate_plan, ApprovalUi, AutoApprove, NonInteractive, PlanRequest,
    PlanningDetails, PlanningOptions, StatusCounts, TaskRuntime, TaskSpec, TaskStatus, WaveSpec,
    WorkflowDetails, WorkflowEngine, WorkflowOptions, WorkflowOutcome, WorkflowPlan,
};
