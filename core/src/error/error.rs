use thiserror::Error;

use super::plan::PlanError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("workflow failed: {0}")]
    Workflow(#[from] WorkflowError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("config error: {0}")]
    Config(String),
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("stream io error: {stream} {source}")]
    StreamIo {
        stream: &'static str,
        source: std::io::Error,
    },
    #[error("plugin error: {0}")]
    Plugin(#[from] anyhow::Error),
}

/// Failures that stop a workflow before or outside the per-task retry loop.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("Missing required agents. {requested}. Available: {available}")]
    MissingAgents { requested: String, available: String },

    #[error("runner error: {0}")]
    Runner(#[from] RunnerError),
}
