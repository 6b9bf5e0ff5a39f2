use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::types::{RunOutcome, RunnerStartArgs, Signal};

#[async_trait]
pub trait RunnerSession: Send {
    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;
    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;
    async fn signal(&mut self, signal: Signal) -> anyhow::Result<()>;
    async fn wait(&mut self) -> anyhow::Result<RunOutcome>;
}

/// Launches agent processes. The process implementation lives in the plugins crate;
/// tests substitute scripted sessions.
#[async_trait]
pub trait RunnerPlugin: Send + Sync {
    fn name(&self) -> &str;
    async fn start_session(&self, args: &RunnerStartArgs)
        -> anyhow::Result<Box<dyn RunnerSession>>;
}
