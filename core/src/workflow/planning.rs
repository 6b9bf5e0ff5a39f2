use crate::agents::{list_agent_names, lookup};
use crate::events::WorkflowEvent;
use crate::report::parse_planned_waves;
use crate::runner::AgentInvocation;
use crate::usage::UsageSummary;

use super::approval::{confirm_project_agents_if_needed, PROJECT_AGENTS_DECLINED};
use super::engine::WorkflowEngine;
use super::prompts::{build_planner_prompt, compose_system_prompt, PLANNER_TASK_PROMPT};
use super::types::{PlanningDetails, PlanningOptions, WorkflowOptions, WorkflowOutcome, WorkflowPlan};
use super::validate::{validate_goal, validate_plan};

pub const PLANNER_FAILED: &str = "Planner failed to produce a valid workflow plan after retries.";

/// Free-form goal in, executed workflow out.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub goal: String,
    pub planning: PlanningOptions,
    pub workflow: WorkflowOptions,
}

impl WorkflowEngine {
    /// Ask the planner agent for waves, retrying with feedback, then execute the plan.
    #[tracing::instrument(name = "workflow.plan_and_execute", skip_all, fields(goal = %request.goal))]
    pub async fn plan_and_execute(&self, request: PlanRequest) -> WorkflowOutcome {
        let PlanRequest {
            goal,
            planning,
            workflow,
        } = request;
        let planning = planning.clamped();
        let workflow = workflow.clamped();
        if let Err(e) = validate_goal(&goal) {
            return WorkflowOutcome::error(e.to_string());
        }

        let discovery = self.discoverer.discover(&self.root, workflow.agent_scope);
        let planner = lookup(&discovery.agents, &planning.planner_agent);
        let worker = lookup(&discovery.agents, &workflow.worker_agent);
        let critic = lookup(&discovery.agents, &workflow.critic_agent);
        let (Some(planner), Some(worker), Some(critic)) = (planner, worker, critic) else {
            return WorkflowOutcome::error(format!(
                "Missing required agents. planner={} worker={} critic={}. Available: {}",
                planning.planner_agent,
                workflow.worker_agent,
                workflow.critic_agent,
                list_agent_names(&discovery.agents)
            ));
        };

        if !confirm_project_agents_if_needed(
            self.approval.as_ref(),
            workflow.agent_scope,
            workflow.confirm_project_agents,
            &discovery,
            &[planner, worker, critic],
        )
        .await
        {
            return WorkflowOutcome::cancelled(PROJECT_AGENTS_DECLINED);
        }

        let mut feedback: Vec<String> = Vec::new();
        let mut usage = UsageSummary::default();
        let mut used_attempts = 0;
        let mut planned = None;

        for attempt in 1..=planning.planning_attempts {
            used_attempts = attempt;
            self.events.send(WorkflowEvent::progress(
                None,
                format!("Planner attempt {}/{}", attempt, planning.planning_attempts),
            ));

            let system_prompt = compose_system_prompt(
                &build_planner_prompt(
                    &goal,
                    planning.max_waves,
                    planning.max_tasks_per_wave,
                    &planning.context,
                    &planning.constraints,
                    &feedback,
                ),
                &planner.instructions,
            );
            let run = self
                .supervisor
                .run(AgentInvocation {
                    agent: planner,
                    prompt: PLANNER_TASK_PROMPT.to_string(),
                    system_prompt: Some(system_prompt),
                    cwd: self.root.clone(),
                    cancel: self.cancel.clone(),
                    progress: None,
                })
                .await;
            usage += run.usage;

            if !run.succeeded() {
                let stderr = run.stderr.trim();
                tracing::warn!(attempt, exit_code = run.exit_code, "planner failed");
                feedback = vec![if stderr.is_empty() {
                    "planner exited with non-zero code".to_string()
                } else {
                    stderr.to_string()
                }];
                continue;
            }

            let candidate = parse_planned_waves(&run.final_text, planning.max_waves, planning.max_tasks_per_wave)
                .map(|waves| WorkflowPlan {
                    goal: goal.clone(),
                    waves,
                });
            let violation = match candidate {
                Some(plan) => match validate_plan(&plan) {
                    Ok(()) => {
                        planned = Some(plan);
                        break;
                    }
                    Err(e) => Some(e.to_string()),
                },
                None => None,
            };
            tracing::warn!(attempt, violation = ?violation, "planner output rejected");
            feedback = vec!["Planner output was invalid JSON or schema-invalid.".to_string()];
            feedback.extend(violation);
            feedback.push(
                "Return ONLY strict JSON with top-level waves[] and valid task packets.".to_string(),
            );
        }

        let Some(plan) = planned else {
            return WorkflowOutcome::error(PLANNER_FAILED);
        };
        tracing::info!(attempts = used_attempts, waves = plan.waves.len(), "plan accepted");
        let tasks = match self.prepare_tasks(&plan, &workflow) {
            Ok(tasks) => tasks,
            Err(outcome) => return outcome,
        };

        let details = PlanningDetails {
            planner_agent: planner.name.clone(),
            attempts: used_attempts,
            usage,
        };
        // Same worker and critic that were approved above, no second discovery pass.
        self.execute_with_agents(plan, tasks, workflow, worker, critic, Some(details))
            .await
    }
}
