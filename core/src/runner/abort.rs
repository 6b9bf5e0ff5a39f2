use std::time::Duration;

use super::traits::RunnerSession;
use super::types::{RunOutcome, Signal};

/// Graceful termination first, forced kill once `grace_ms` elapses without exit.
pub async fn terminate_with_grace(
    session: &mut Box<dyn RunnerSession>,
    grace_ms: u64,
) -> anyhow::Result<RunOutcome> {
    if let Err(e) = session.signal(Signal::Term).await {
        tracing::warn!(error.kind = "runner.signal", signal = "term", error.message = %e);
    }

    match tokio::time::timeout(Duration::from_millis(grace_ms), session.wait()).await {
        Ok(res) => res,
        Err(_) => {
            tracing::warn!(grace_ms, "agent did not exit after termination signal, killing");
            if let Err(e) = session.signal(Signal::Kill).await {
                tracing::warn!(error.kind = "runner.signal", signal = "kill", error.message = %e);
            }
            session.wait().await
        }
    }
}
