use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::agents::AgentSource;
use crate::usage::UsageSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Kill,
    Term,
}

#[derive(Debug, Clone)]
pub struct RunnerStartArgs {
    pub cmd: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub envs: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RunOutcome {
    pub exit_code: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressPhase {
    Model,
    Tool,
}

/// Live progress from a running agent: a tool invocation or a model text fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProgress {
    pub phase: ProgressPhase,
    pub text: String,
}

/// Everything captured from one agent invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRunResult {
    pub agent: String,
    pub source: AgentSource,
    pub exit_code: i32,
    pub final_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    pub stderr: String,
    pub usage: UsageSummary,
    pub tool_calls: u64,
    #[serde(skip)]
    pub messages: Vec<serde_json::Value>,
}

impl AgentRunResult {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}
