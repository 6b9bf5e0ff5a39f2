//! Wave scheduler: validation, approval gates, then waves in order with a bounded
//! fan-out per wave and an optional fail-fast gate between waves.
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::agents::{list_agent_names, lookup, AgentConfig, AgentDiscoverer};
use crate::error::{PlanError, WorkflowError};
use crate::events::{EventsTx, WorkflowEvent};
use crate::executor::map_with_concurrency;
use crate::runner::AgentSupervisor;

use super::approval::{
    confirm_project_agents_if_needed, require_execution_approval, ApprovalUi,
    PROJECT_AGENTS_DECLINED,
};
use super::summary::{result_text, WORKFLOW_CANCELLED};
use super::task::TaskExecutor;
use super::types::{
    PlanningDetails, StatusCounts, TaskRuntime, TaskStatus, WorkflowDetails, WorkflowOptions,
    WorkflowOutcome, WorkflowPlan,
};
use super::validate::{preflight, resolve_task_cwd};

pub struct WorkflowEngine {
    pub(crate) supervisor: AgentSupervisor,
    pub(crate) discoverer: Arc<dyn AgentDiscoverer>,
    pub(crate) approval: Arc<dyn ApprovalUi>,
    pub(crate) events: EventsTx,
    pub(crate) cancel: CancellationToken,
    pub(crate) root: PathBuf,
}

impl WorkflowEngine {
    pub fn new(
        supervisor: AgentSupervisor,
        discoverer: Arc<dyn AgentDiscoverer>,
        approval: Arc<dyn ApprovalUi>,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            supervisor,
            discoverer,
            approval,
            events: EventsTx::disabled(),
            cancel: CancellationToken::new(),
            root: root.into(),
        }
    }

    pub fn with_events(mut self, events: EventsTx) -> Self {
        self.events = events;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token spanning the whole run; cancelling it terminates every running agent.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    #[tracing::instrument(name = "workflow.execute", skip_all, fields(goal = %plan.goal, waves = plan.waves.len()))]
    pub async fn execute_workflow(&self, plan: WorkflowPlan, options: WorkflowOptions) -> WorkflowOutcome {
        let options = options.clamped();
        let tasks = match self.prepare_tasks(&plan, &options) {
            Ok(tasks) => tasks,
            Err(outcome) => return outcome,
        };

        let discovery = self.discoverer.discover(&self.root, options.agent_scope);
        let worker = lookup(&discovery.agents, &options.worker_agent);
        let critic = lookup(&discovery.agents, &options.critic_agent);
        let (Some(worker), Some(critic)) = (worker, critic) else {
            let err = WorkflowError::MissingAgents {
                requested: format!("worker={} critic={}", options.worker_agent, options.critic_agent),
                available: list_agent_names(&discovery.agents),
            };
            return WorkflowOutcome::error(err.to_string());
        };

        if !confirm_project_agents_if_needed(
            self.approval.as_ref(),
            options.agent_scope,
            options.confirm_project_agents,
            &discovery,
            &[worker, critic],
        )
        .await
        {
            return WorkflowOutcome::cancelled(PROJECT_AGENTS_DECLINED);
        }

        self.execute_with_agents(plan, tasks, options, worker, critic, None)
            .await
    }

    /// Pre-flight gate and cwd resolution. Nothing has been spawned when this fails.
    pub(crate) fn prepare_tasks(
        &self,
        plan: &WorkflowPlan,
        options: &WorkflowOptions,
    ) -> Result<Vec<TaskRuntime>, WorkflowOutcome> {
        if let Err(e) = preflight(plan, options.max_tasks) {
            tracing::warn!(error.kind = "plan.preflight", error.message = %e);
            return Err(WorkflowOutcome::error(e.to_string()));
        }
        create_task_runtimes(plan, &self.root).map_err(|e| {
            tracing::warn!(error.kind = "plan.cwd", error.message = %e);
            WorkflowOutcome::error(e.to_string())
        })
    }

    /// Execution approval, then the waves, with agents that were already resolved and
    /// approved by the caller.
    pub(crate) async fn execute_with_agents(
        &self,
        plan: WorkflowPlan,
        tasks: Vec<TaskRuntime>,
        options: WorkflowOptions,
        worker: &AgentConfig,
        critic: &AgentConfig,
        planning: Option<PlanningDetails>,
    ) -> WorkflowOutcome {
        if let Err(message) =
            require_execution_approval(self.approval.as_ref(), &plan, options.execution_approved).await
        {
            return WorkflowOutcome::cancelled(message);
        }

        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        tracing::info!(
            run_id = %run_id,
            tasks = tasks.len(),
            worker = %worker.name,
            critic = %critic.name,
            max_concurrency = options.max_concurrency,
            "workflow started"
        );
        self.events.send(WorkflowEvent::RunStart {
            run_id: run_id.clone(),
            goal: plan.goal.clone(),
            total_waves: plan.waves.len(),
            total_tasks: tasks.len(),
        });

        let tasks = self
            .run_waves(&plan, tasks, &options, |cancel| TaskExecutor {
                supervisor: &self.supervisor,
                goal: &plan.goal,
                worker,
                critic,
                max_attempts: options.max_worker_attempts,
                critic_output_limit: options.critic_output_limit,
                cancel,
                events: &self.events,
            })
            .await;
        let interrupted = self.cancel.is_cancelled();

        let details = WorkflowDetails {
            run_id: run_id.clone(),
            goal: plan.goal.clone(),
            worker_agent: worker.name.clone(),
            critic_agent: critic.name.clone(),
            agent_scope: options.agent_scope,
            max_worker_attempts: options.max_worker_attempts,
            started_at,
            finished_at: Some(Utc::now()),
            tasks,
            planning,
        };
        let counts = details.counts();
        let usage = details.usage();
        let is_error = counts.has_errors() || interrupted;

        tracing::info!(
            run_id = %run_id,
            completed = counts.completed,
            blocked = counts.blocked,
            failed = counts.failed,
            skipped = counts.skipped,
            interrupted,
            "workflow finished"
        );
        self.events.send(WorkflowEvent::RunEnd {
            run_id,
            counts,
            usage,
            is_error,
        });

        let text = if interrupted {
            format!("{WORKFLOW_CANCELLED}\n{}", result_text(&counts, &usage))
        } else {
            result_text(&counts, &usage)
        };
        WorkflowOutcome {
            text,
            details: Some(details),
            is_error,
            cancelled: interrupted,
        }
    }

    async fn run_waves<'a, F>(
        &self,
        plan: &WorkflowPlan,
        tasks: Vec<TaskRuntime>,
        options: &WorkflowOptions,
        make_executor: F,
    ) -> Vec<TaskRuntime>
    where
        F: Fn(CancellationToken) -> TaskExecutor<'a>,
    {
        let mut by_wave: Vec<Vec<TaskRuntime>> = vec![Vec::new(); plan.waves.len()];
        for task in tasks {
            let index = task.wave_index;
            by_wave[index].push(task);
        }

        for wave_index in 0..by_wave.len() {
            if self.cancel.is_cancelled() {
                tracing::info!(wave_index, "run cancelled, not starting further waves");
                self.skip_pending_after(&mut by_wave, wave_index, None);
                break;
            }

            let batch = std::mem::take(&mut by_wave[wave_index]);
            let wave_name = plan.waves[wave_index].display_name(wave_index);
            self.events.send(WorkflowEvent::WaveStart {
                wave_index,
                wave_name: wave_name.clone(),
                task_ids: batch.iter().map(|t| t.id.clone()).collect(),
            });

            let wave_cancel = self.cancel.child_token();
            let executor = make_executor(wave_cancel.clone());
            let executor = &executor;
            let wave_cancel = &wave_cancel;

            let results = map_with_concurrency(batch, options.max_concurrency, |task, _| {
                let snapshot = task.clone();
                async move {
                    let settled = AssertUnwindSafe(executor.run(task)).catch_unwind().await;
                    let (task, infra_failure) = match settled {
                        Ok(task) => (task, None),
                        Err(panic) => {
                            let message = panic_message(panic.as_ref());
                            tracing::error!(task_id = %snapshot.id, error.kind = "workflow.panic", error.message = %message);
                            wave_cancel.cancel();
                            let mut task = snapshot;
                            task.status = TaskStatus::Failed;
                            task.error = Some(message.clone());
                            (task, Some(message))
                        }
                    };
                    self.events.send(WorkflowEvent::TaskEnd {
                        task: Box::new(task.clone()),
                    });
                    (task, infra_failure)
                }
            })
            .await;

            let mut infra_failure: Option<String> = None;
            let mut finished = Vec::with_capacity(results.len());
            for (task, failure) in results {
                if infra_failure.is_none() {
                    infra_failure = failure;
                }
                finished.push(task);
            }

            if let Some(message) = infra_failure {
                // Siblings interrupted by the abort count as failed with the same cause.
                for task in finished.iter_mut() {
                    if !matches!(task.status, TaskStatus::Completed | TaskStatus::Blocked) {
                        task.status = TaskStatus::Failed;
                        task.error = Some(message.clone());
                    }
                }
                by_wave[wave_index] = finished;
                for task in by_wave.iter_mut().skip(wave_index + 1).flatten() {
                    if task.status == TaskStatus::Pending || task.status.is_running() {
                        task.status = TaskStatus::Failed;
                        task.error = Some(message.clone());
                    }
                }
                break;
            }

            let counts = StatusCounts::from_tasks(&finished);
            let wave_failed = finished.iter().any(|t| t.status.is_failure());
            by_wave[wave_index] = finished;
            self.events.send(WorkflowEvent::WaveEnd {
                wave_index,
                wave_name,
                counts,
            });

            if wave_failed && options.fail_fast {
                tracing::info!(wave_index, "wave failed, skipping remaining waves");
                self.skip_pending_after(&mut by_wave, wave_index + 1, Some(wave_index));
                break;
            }
        }

        by_wave.into_iter().flatten().collect()
    }

    fn skip_pending_after(
        &self,
        by_wave: &mut [Vec<TaskRuntime>],
        from_wave: usize,
        after_wave: Option<usize>,
    ) {
        let mut skipped = Vec::new();
        for task in by_wave.iter_mut().skip(from_wave).flatten() {
            if task.status == TaskStatus::Pending {
                task.status = TaskStatus::Skipped;
                skipped.push(task.id.clone());
            }
        }
        if !skipped.is_empty() {
            self.events.send(WorkflowEvent::WavesSkipped {
                after_wave: after_wave.unwrap_or(from_wave),
                task_ids: skipped,
            });
        }
    }
}

/// One runtime per task in plan order, with every cwd resolved up front so a
/// containment violation stops the run before anything is spawned.
pub(crate) fn create_task_runtimes(
    plan: &WorkflowPlan,
    root: &Path,
) -> Result<Vec<TaskRuntime>, PlanError> {
    let mut tasks = Vec::with_capacity(plan.total_tasks());
    for (wave_index, wave) in plan.waves.iter().enumerate() {
        let wave_name = wave.display_name(wave_index);
        for spec in &wave.tasks {
            let cwd = resolve_task_cwd(root, spec.cwd.as_deref())?;
            tasks.push(TaskRuntime::new(spec, wave_index, wave_name.clone(), cwd));
        }
    }
    Ok(tasks)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "workflow task panicked".to_string()
    }
}
