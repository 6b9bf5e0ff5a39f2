//! Agent supervisor: one external process per invocation, its line-JSON stdout folded
//! into an [`AgentRunResult`], with cancellation escalating from terminate to kill.
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::agents::AgentConfig;
use crate::config::{ControlConfig, RunnerConfig};
use crate::util::RingBytes;

use super::abort;
use super::args::build_agent_args;
use super::io_pump;
use super::stream::AgentStreamState;
use super::traits::RunnerPlugin;
use super::types::{AgentProgress, AgentRunResult, RunnerStartArgs};

/// Exit code reported for an invocation stopped through its cancellation token.
pub const CANCELLED_EXIT_CODE: i32 = 130;

pub struct AgentInvocation<'a> {
    pub agent: &'a AgentConfig,
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub cwd: PathBuf,
    pub cancel: CancellationToken,
    pub progress: Option<mpsc::UnboundedSender<AgentProgress>>,
}

#[derive(Clone)]
pub struct AgentSupervisor {
    runner: Arc<dyn RunnerPlugin>,
    runner_cfg: RunnerConfig,
    control: ControlConfig,
}

enum Step {
    Cancel,
    Line(Option<String>),
}

impl AgentSupervisor {
    pub fn new(runner: Arc<dyn RunnerPlugin>, runner_cfg: RunnerConfig, control: ControlConfig) -> Self {
        Self {
            runner,
            runner_cfg,
            control,
        }
    }

    pub fn runner_name(&self) -> &str {
        self.runner.name()
    }

    /// Run one agent to completion. Spawn and wait failures become a non-zero exit code
    /// rather than an error, so callers handle every failure through the same path.
    pub async fn run(&self, inv: AgentInvocation<'_>) -> AgentRunResult {
        let started = Instant::now();
        let grace_ms = self.control.abort_grace_ms;
        let args = build_agent_args(
            &self.runner_cfg.base_args,
            inv.agent,
            inv.system_prompt.as_deref(),
            &inv.prompt,
        );
        let start_args = RunnerStartArgs {
            cmd: self.runner_cfg.binary.clone(),
            args,
            cwd: inv.cwd.clone(),
            envs: self.runner_cfg.env.clone(),
        };

        tracing::debug!(
            agent = %inv.agent.name,
            runner = self.runner.name(),
            cwd = %inv.cwd.display(),
            "starting agent"
        );

        let mut session = match self.runner.start_session(&start_args).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(agent = %inv.agent.name, error.kind = "runner.spawn", error.message = %e);
                return AgentRunResult {
                    agent: inv.agent.name.clone(),
                    source: inv.agent.source,
                    exit_code: 1,
                    final_text: String::new(),
                    stop_reason: None,
                    stderr: format!("failed to start {}: {e}", start_args.cmd),
                    usage: Default::default(),
                    tool_calls: 0,
                    messages: Vec::new(),
                };
            }
        };

        let (line_tx, mut line_rx) =
            mpsc::channel::<String>(self.control.line_tap_channel_capacity.max(1));
        let out_task = session
            .stdout()
            .map(|rd| io_pump::pump_stdout_lines(rd, line_tx));
        let ring_err = RingBytes::new(self.control.stderr_capture_bytes);
        let err_task = session
            .stderr()
            .map(|rd| io_pump::pump_stderr_capture(rd, ring_err.clone()));

        let mut state = AgentStreamState::new(self.control.progress_preview_chars);
        let mut cancelled = false;
        let mut terminated = None;

        if inv.cancel.is_cancelled() {
            cancelled = true;
            terminated = Some(abort::terminate_with_grace(&mut session, grace_ms).await);
        }

        loop {
            let step = tokio::select! {
                biased;
                _ = inv.cancel.cancelled(), if !cancelled => Step::Cancel,
                line = recv_line(&mut line_rx, cancelled, grace_ms) => Step::Line(line),
            };
            match step {
                Step::Cancel => {
                    tracing::info!(agent = %inv.agent.name, "cancellation requested, terminating agent");
                    cancelled = true;
                    terminated = Some(abort::terminate_with_grace(&mut session, grace_ms).await);
                }
                Step::Line(Some(line)) => {
                    if let Some(progress) = state.handle_line(&line) {
                        if let Some(tx) = &inv.progress {
                            let _ = tx.send(progress);
                        }
                    }
                }
                Step::Line(None) => break,
            }
        }

        let outcome = match terminated {
            Some(res) => res,
            None => {
                let waited = tokio::select! {
                    biased;
                    _ = inv.cancel.cancelled() => None,
                    res = session.wait() => Some(res),
                };
                match waited {
                    Some(res) => res,
                    None => {
                        cancelled = true;
                        abort::terminate_with_grace(&mut session, grace_ms).await
                    }
                }
            }
        };

        if let Some(task) = out_task {
            if cancelled {
                task.abort();
            }
            if let Ok(Err(e)) = task.await {
                tracing::warn!(agent = %inv.agent.name, error.kind = "runner.stdout", error.message = %e);
            }
        }
        if let Some(mut task) = err_task {
            match tokio::time::timeout(Duration::from_millis(grace_ms), &mut task).await {
                Ok(Ok(Err(e))) => {
                    tracing::warn!(agent = %inv.agent.name, error.kind = "runner.stderr", error.message = %e)
                }
                Err(_) => task.abort(),
                _ => {}
            }
        }

        let exit_code = if cancelled {
            CANCELLED_EXIT_CODE
        } else {
            match outcome {
                Ok(o) => o.exit_code,
                Err(e) => {
                    tracing::warn!(agent = %inv.agent.name, error.kind = "runner.wait", error.message = %e);
                    1
                }
            }
        };

        tracing::debug!(
            agent = %inv.agent.name,
            exit_code,
            tool_calls = state.tool_calls,
            turns = state.usage.turns,
            duration_ms = started.elapsed().as_millis() as u64,
            "agent finished"
        );

        AgentRunResult {
            agent: inv.agent.name.clone(),
            source: inv.agent.source,
            exit_code,
            final_text: state.final_text(),
            stop_reason: state.stop_reason,
            stderr: ring_err.to_string_lossy(),
            usage: state.usage,
            tool_calls: state.tool_calls,
            messages: state.messages,
        }
    }
}

/// After cancellation the remaining output is drained for at most one grace period.
async fn recv_line(rx: &mut mpsc::Receiver<String>, cancelled: bool, grace_ms: u64) -> Option<String> {
    if cancelled {
        tokio::time::timeout(Duration::from_millis(grace_ms), rx.recv())
            .await
            .unwrap_or(None)
    } else {
        rx.recv().await
    }
}
