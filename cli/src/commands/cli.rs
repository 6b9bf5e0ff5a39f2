use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use wavecrew_core::agents::AgentScope;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeArg {
    User,
    Project,
    Both,
}

impl From<ScopeArg> for AgentScope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::User => AgentScope::User,
            ScopeArg::Project => AgentScope::Project,
            ScopeArg::Both => AgentScope::Both,
        }
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Jsonl,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Jsonl => "jsonl",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "wavecrew", version, about = "Run wave-based worker/critic agent workflows")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to load instead of ~/.wavecrew/config.toml or ./wavecrew.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Project root. Task cwds resolve against it and must stay inside it.
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Agent CLI binary, overriding `runner.binary`.
    #[arg(long, global = true)]
    pub agent_bin: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a wave plan read from a JSON file.
    Run(RunArgs),
    /// Ask the planner agent for a plan, then execute it.
    Plan(PlanArgs),
    /// List the agents visible for a scope.
    Agents(AgentsArgs),
}

/// Options shared by `run` and `plan`.
#[derive(ClapArgs, Debug, Clone)]
pub struct WorkflowArgs {
    #[arg(long)]
    pub worker_agent: Option<String>,

    #[arg(long)]
    pub critic_agent: Option<String>,

    /// 1-8 tasks in flight per wave.
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// 1-3 worker attempts per task.
    #[arg(long)]
    pub max_worker_attempts: Option<u32>,

    /// Keep running later waves after a wave has failed or blocked tasks.
    #[arg(long)]
    pub no_fail_fast: bool,

    #[arg(long, value_enum)]
    pub agent_scope: Option<ScopeArg>,

    /// Do not ask before using project-local agents.
    #[arg(long)]
    pub no_confirm_project_agents: bool,

    /// Approve execution without prompting.
    #[arg(long, short = 'y')]
    pub yes: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Print every task record in the final result.
    #[arg(long)]
    pub expanded: bool,

    /// ASCII status markers in text output.
    #[arg(long)]
    pub ascii: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Plan file: {"goal": "...", "waves": [{"name": "...", "tasks": [...]}]}
    #[arg(long)]
    pub plan: PathBuf,

    #[command(flatten)]
    pub workflow: WorkflowArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PlanArgs {
    #[arg(long)]
    pub goal: String,

    #[arg(long)]
    pub planner_agent: Option<String>,

    /// Extra planning context. Can be specified multiple times.
    #[arg(long = "context", action = clap::ArgAction::Append)]
    pub context: Vec<String>,

    /// Planning constraint. Can be specified multiple times.
    #[arg(long = "constraint", action = clap::ArgAction::Append)]
    pub constraints: Vec<String>,

    #[arg(long)]
    pub max_waves: Option<usize>,

    #[arg(long)]
    pub max_tasks_per_wave: Option<usize>,

    #[arg(long)]
    pub planning_attempts: Option<u32>,

    #[command(flatten)]
    pub workflow: WorkflowArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct AgentsArgs {
    #[arg(long, value_enum, default_value_t = ScopeArg::Both)]
    pub agent_scope: ScopeArg,
}
