use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::agents::AgentScope;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub control: ControlConfig,

    #[serde(default)]
    pub workflow: WorkflowConfig,

    #[serde(default)]
    pub planner: PlannerConfig,

    #[serde(default)]
    pub agents: AgentsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "wavecrew_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// How the external agent CLI is launched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default = "default_runner_binary")]
    pub binary: String,

    /// Arguments selecting the line-JSON output mode; always passed first.
    #[serde(default = "default_runner_base_args")]
    pub base_args: Vec<String>,

    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_runner_binary() -> String {
    "pi".to_string()
}

fn default_runner_base_args() -> Vec<String> {
    ["--mode", "json", "-p", "--no-session"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            binary: default_runner_binary(),
            base_args: default_runner_base_args(),
            env: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Time between the graceful termination signal and the forced kill.
    #[serde(default = "default_abort_grace_ms")]
    pub abort_grace_ms: u64,

    #[serde(default = "default_line_tap_channel_capacity")]
    pub line_tap_channel_capacity: usize,

    #[serde(default = "default_stderr_capture_bytes")]
    pub stderr_capture_bytes: usize,

    #[serde(default = "default_progress_preview_chars")]
    pub progress_preview_chars: usize,
}

fn default_abort_grace_ms() -> u64 {
    3_000
}

fn default_line_tap_channel_capacity() -> usize {
    1024
}

fn default_stderr_capture_bytes() -> usize {
    64 * 1024
}

fn default_progress_preview_chars() -> usize {
    120
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            abort_grace_ms: default_abort_grace_ms(),
            line_tap_channel_capacity: default_line_tap_channel_capacity(),
            stderr_capture_bytes: default_stderr_capture_bytes(),
            progress_preview_chars: default_progress_preview_chars(),
        }
    }
}

pub const MAX_CONCURRENCY_CEILING: usize = 8;
pub const MAX_WORKER_ATTEMPTS_CEILING: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default = "default_worker_agent")]
    pub worker_agent: String,

    #[serde(default = "default_critic_agent")]
    pub critic_agent: String,

    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    #[serde(default = "default_max_worker_attempts")]
    pub max_worker_attempts: u32,

    #[serde(default = "default_true")]
    pub fail_fast: bool,

    #[serde(default)]
    pub agent_scope: AgentScope,

    #[serde(default = "default_true")]
    pub confirm_project_agents: bool,

    /// Ceiling on the number of tasks across all waves of one plan.
    #[serde(default = "default_max_tasks")]
    pub max_tasks: usize,

    /// Worker output longer than this is truncated before it reaches the critic.
    #[serde(default = "default_critic_output_limit")]
    pub critic_output_limit: usize,
}

fn default_worker_agent() -> String {
    "implementer".to_string()
}

fn default_critic_agent() -> String {
    "critic".to_string()
}

fn default_max_concurrency() -> usize {
    4
}

fn default_max_worker_attempts() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

fn default_max_tasks() -> usize {
    64
}

fn default_critic_output_limit() -> usize {
    7000
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            worker_agent: default_worker_agent(),
            critic_agent: default_critic_agent(),
            max_concurrency: default_max_concurrency(),
            max_worker_attempts: default_max_worker_attempts(),
            fail_fast: true,
            agent_scope: AgentScope::default(),
            confirm_project_agents: true,
            max_tasks: default_max_tasks(),
            critic_output_limit: default_critic_output_limit(),
        }
    }
}

pub const MAX_WAVES_CEILING: usize = 12;
pub const MAX_TASKS_PER_WAVE_CEILING: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default = "default_planner_agent")]
    pub planner_agent: String,

    #[serde(default = "default_max_waves")]
    pub max_waves: usize,

    #[serde(default = "default_max_tasks_per_wave")]
    pub max_tasks_per_wave: usize,

    #[serde(default = "default_planning_attempts")]
    pub planning_attempts: u32,
}

fn default_planner_agent() -> String {
    "planner".to_string()
}

fn default_max_waves() -> usize {
    6
}

fn default_max_tasks_per_wave() -> usize {
    6
}

fn default_planning_attempts() -> u32 {
    2
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            planner_agent: default_planner_agent(),
            max_waves: default_max_waves(),
            max_tasks_per_wave: default_max_tasks_per_wave(),
            planning_attempts: default_planning_attempts(),
        }
    }
}

/// Where agent definitions are looked up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsConfig {
    #[serde(default = "default_user_agents_dir")]
    pub user_dir: String,

    /// Relative directory searched upwards from the working directory.
    #[serde(default = "default_project_agents_dir")]
    pub project_dir: String,
}

fn default_user_agents_dir() -> String {
    "~/.pi/agent/agents".to_string()
}

fn default_project_agents_dir() -> String {
    ".pi/agents".to_string()
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            user_dir: default_user_agents_dir(),
            project_dir: default_project_agents_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.runner.binary, "pi");
        assert_eq!(cfg.runner.base_args, vec!["--mode", "json", "-p", "--no-session"]);
        assert_eq!(cfg.control.abort_grace_ms, 3000);
        assert_eq!(cfg.workflow.max_concurrency, 4);
        assert_eq!(cfg.workflow.max_worker_attempts, 2);
        assert!(cfg.workflow.fail_fast);
        assert_eq!(cfg.workflow.agent_scope, AgentScope::User);
        assert_eq!(cfg.workflow.max_tasks, 64);
        assert_eq!(cfg.workflow.critic_output_limit, 7000);
        assert_eq!(cfg.planner.max_waves, 6);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [workflow]
            max_concurrency = 2
            agent_scope = "both"

            [runner]
            binary = "/opt/pi/bin/pi"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.workflow.max_concurrency, 2);
        assert_eq!(cfg.workflow.agent_scope, AgentScope::Both);
        assert_eq!(cfg.workflow.worker_agent, "implementer");
        assert_eq!(cfg.runner.binary, "/opt/pi/bin/pi");
        assert_eq!(cfg.runner.base_args.len(), 4);
    }
}
