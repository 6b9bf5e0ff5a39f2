use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::agents::AgentConfig;
use crate::events::{EventsTx, WorkflowEvent};
use crate::report::{CriticDecision, CriticReport, WorkerReport, WorkerStatus};
use crate::runner::{AgentInvocation, AgentProgress, AgentRunResult, AgentSupervisor, ProgressPhase};

use super::prompts::{
    build_critic_prompt, build_worker_prompt, compose_system_prompt, CRITIC_TASK_PROMPT,
    WORKER_TASK_PROMPT,
};
use super::types::{TaskRuntime, TaskStatus};

const STRICT_JSON_FEEDBACK: &str = "Return ONLY strict JSON using required keys.";

/// Everything one task's worker/critic loop needs, shared read-only by all tasks of a wave.
pub(crate) struct TaskExecutor<'a> {
    pub supervisor: &'a AgentSupervisor,
    pub goal: &'a str,
    pub worker: &'a AgentConfig,
    pub critic: &'a AgentConfig,
    pub max_attempts: u32,
    pub critic_output_limit: usize,
    pub cancel: CancellationToken,
    pub events: &'a EventsTx,
}

/// What to do after an attempt step that did not settle the task.
enum Retry {
    With(Vec<String>),
    Exhausted,
}

impl TaskExecutor<'_> {
    /// Drive one task from `pending` to a terminal status. The runtime is moved in and
    /// handed back, so no other task ever sees it mid-flight.
    pub async fn run(&self, mut task: TaskRuntime) -> TaskRuntime {
        let mut feedback: Vec<String> = Vec::new();

        for attempt in 1..=self.max_attempts {
            let last = attempt == self.max_attempts;
            task.attempt = attempt;
            task.status = TaskStatus::RunningWorker;
            task.error = None;
            self.events.send(WorkflowEvent::progress(
                Some(&task.id),
                format!("Worker {} attempt {}/{}", task.id, attempt, self.max_attempts),
            ));

            let worker_run = self.run_worker(&task, &feedback).await;
            absorb_run(&mut task, &worker_run);
            task.worker_agent_source = Some(worker_run.source);

            if !worker_run.succeeded() {
                let error = stderr_or(&worker_run, "worker exited with non-zero code");
                tracing::warn!(task_id = %task.id, attempt, exit_code = worker_run.exit_code, "worker failed");
                match self.retry_or_fail(&mut task, error.clone(), last, vec![error]) {
                    Retry::With(next) => {
                        feedback = next;
                        continue;
                    }
                    Retry::Exhausted => return task,
                }
            }

            let Some(worker_report) = WorkerReport::parse(&worker_run.final_text) else {
                let error = "worker output did not match required JSON schema".to_string();
                tracing::warn!(task_id = %task.id, attempt, "worker report rejected");
                let next = vec![error.clone(), STRICT_JSON_FEEDBACK.to_string()];
                match self.retry_or_fail(&mut task, error, last, next) {
                    Retry::With(next) => {
                        feedback = next;
                        continue;
                    }
                    Retry::Exhausted => return task,
                }
            };

            task.worker_summary = Some(worker_report.summary.clone());
            task.files_touched = worker_report.files_touched.clone();
            task.blockers = worker_report.blockers.clone();

            task.status = TaskStatus::RunningCritic;
            self.events.send(WorkflowEvent::progress(
                Some(&task.id),
                format!("Critic reviewing {}", task.id),
            ));

            let critic_run = self.run_critic(&task, &worker_run.final_text).await;
            absorb_run(&mut task, &critic_run);
            task.critic_agent_source = Some(critic_run.source);

            if !critic_run.succeeded() {
                let error = stderr_or(&critic_run, "critic exited with non-zero code");
                tracing::warn!(task_id = %task.id, attempt, exit_code = critic_run.exit_code, "critic failed");
                match self.retry_or_fail(&mut task, error.clone(), last, vec![error]) {
                    Retry::With(next) => {
                        feedback = next;
                        continue;
                    }
                    Retry::Exhausted => return task,
                }
            }

            let Some(critic_report) = CriticReport::parse(&critic_run.final_text) else {
                let error = "critic output did not match required JSON schema".to_string();
                tracing::warn!(task_id = %task.id, attempt, "critic report rejected");
                let next = vec![error.clone(), STRICT_JSON_FEEDBACK.to_string()];
                match self.retry_or_fail(&mut task, error, last, next) {
                    Retry::With(next) => {
                        feedback = next;
                        continue;
                    }
                    Retry::Exhausted => return task,
                }
            };

            task.critic_decision = Some(critic_report.decision);
            task.issues = critic_report.issues.clone();

            match critic_report.decision {
                CriticDecision::Approve => {
                    if worker_report.status == WorkerStatus::Blocked {
                        task.status = TaskStatus::Blocked;
                        task.error = Some(if worker_report.blockers.is_empty() {
                            "blocked without explicit blocker details".to_string()
                        } else {
                            worker_report.blockers.join("; ")
                        });
                    } else {
                        task.status = TaskStatus::Completed;
                    }
                    tracing::info!(task_id = %task.id, attempt, status = %task.status, "task settled");
                    return task;
                }
                CriticDecision::Revise if !last => {
                    tracing::info!(task_id = %task.id, attempt, "critic requested revision");
                    feedback = critic_report.revision_feedback();
                }
                CriticDecision::Revise => {
                    task.error = Some(critic_report.failure_reason());
                    task.status = TaskStatus::Failed;
                    tracing::info!(task_id = %task.id, attempt, "revisions exhausted");
                    return task;
                }
            }
        }

        // Only reachable with a zero attempt budget, which option clamping prevents.
        if !task.status.is_terminal() {
            task.status = TaskStatus::Failed;
            task.error.get_or_insert_with(|| "no attempts were made".to_string());
        }
        task
    }

    fn retry_or_fail(
        &self,
        task: &mut TaskRuntime,
        error: String,
        last: bool,
        next_feedback: Vec<String>,
    ) -> Retry {
        task.error = Some(error);
        if last {
            task.status = TaskStatus::Failed;
            Retry::Exhausted
        } else {
            Retry::With(next_feedback)
        }
    }

    async fn run_worker(&self, task: &TaskRuntime, feedback: &[String]) -> AgentRunResult {
        let system_prompt = compose_system_prompt(
            &build_worker_prompt(self.goal, task, feedback),
            &self.worker.instructions,
        );
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<AgentProgress>();

        let run = self.supervisor.run(AgentInvocation {
            agent: self.worker,
            prompt: WORKER_TASK_PROMPT.to_string(),
            system_prompt: Some(system_prompt),
            cwd: task.cwd.clone(),
            cancel: self.cancel.clone(),
            progress: Some(progress_tx),
        });
        let forward = async {
            while let Some(progress) = progress_rx.recv().await {
                if progress.phase == ProgressPhase::Tool {
                    self.events.send(WorkflowEvent::progress(
                        Some(&task.id),
                        format!("Task {}: {}", task.id, progress.text),
                    ));
                }
            }
        };

        let (result, ()) = tokio::join!(run, forward);
        result
    }

    async fn run_critic(&self, task: &TaskRuntime, worker_output: &str) -> AgentRunResult {
        let system_prompt = compose_system_prompt(
            &build_critic_prompt(self.goal, task, worker_output, self.critic_output_limit),
            &self.critic.instructions,
        );
        self.supervisor
            .run(AgentInvocation {
                agent: self.critic,
                prompt: CRITIC_TASK_PROMPT.to_string(),
                system_prompt: Some(system_prompt),
                cwd: task.cwd.clone(),
                cancel: self.cancel.clone(),
                progress: None,
            })
            .await
    }
}

fn absorb_run(task: &mut TaskRuntime, run: &AgentRunResult) {
    task.usage += run.usage;
    task.tool_calls += run.tool_calls;
}

fn stderr_or(run: &AgentRunResult, fallback: &str) -> String {
    let trimmed = run.stderr.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
