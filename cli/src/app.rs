use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use wavecrew_core::api as core_api;
use wavecrew_core::api::{
    AgentScope, AppConfig, CliError, PlanRequest, PlanningOptions, WorkflowOptions,
    WorkflowOutcome, WorkflowPlan,
};
use wavecrew_plugins::factory;

use crate::commands::cli::{AgentsArgs, PlanArgs, RunArgs, WorkflowArgs};
use crate::ui::TerminalApproval;

enum Job {
    Execute(WorkflowPlan, WorkflowOptions),
    PlanAndExecute(PlanRequest),
}

pub async fn run_plan_file(cfg: &AppConfig, root: PathBuf, args: RunArgs) -> Result<i32, CliError> {
    let text = std::fs::read_to_string(&args.plan)?;
    let plan = core_api::parse_plan_json(&text).map_err(core_api::WorkflowError::from)?;
    tracing::info!(plan = %args.plan.display(), waves = plan.waves.len(), "plan loaded");

    let options = workflow_options(cfg, &args.workflow);
    run_job(cfg, root, Job::Execute(plan, options), &args.workflow).await
}

pub async fn run_planner(cfg: &AppConfig, root: PathBuf, args: PlanArgs) -> Result<i32, CliError> {
    let request = PlanRequest {
        goal: args.goal.clone(),
        planning: planning_options(cfg, &args),
        workflow: workflow_options(cfg, &args.workflow),
    };
    run_job(cfg, root, Job::PlanAndExecute(request), &args.workflow).await
}

pub fn list_agents(cfg: &AppConfig, root: &Path, args: AgentsArgs) -> Result<i32, CliError> {
    let scope: AgentScope = args.agent_scope.into();
    let discovery = factory::build_discoverer(cfg).discover(root, scope);

    if discovery.agents.is_empty() {
        println!("No agents found (scope: {scope}).");
    }
    for agent in &discovery.agents {
        let mut line = format!("{} ({}) - {}", agent.name, agent.source, agent.description);
        if let Some(model) = &agent.model {
            line.push_str(&format!(" [model: {model}]"));
        }
        if let Some(tools) = &agent.tools {
            line.push_str(&format!(" [tools: {}]", tools.join(",")));
        }
        println!("{line}");
    }
    if let Some(dir) = &discovery.project_agents_dir {
        println!("project agents dir: {}", dir.display());
    }
    Ok(0)
}

async fn run_job(cfg: &AppConfig, root: PathBuf, job: Job, args: &WorkflowArgs) -> Result<i32, CliError> {
    let supervisor = core_api::AgentSupervisor::new(
        factory::build_runner(cfg),
        cfg.runner.clone(),
        cfg.control.clone(),
    );
    let (events, mut events_rx) = core_api::EventsTx::channel();
    let cancel = CancellationToken::new();
    let engine = core_api::WorkflowEngine::new(
        supervisor,
        factory::build_discoverer(cfg),
        Arc::new(TerminalApproval::detect()),
        root,
    )
    .with_events(events)
    .with_cancellation(cancel.clone());

    let renderer: Arc<dyn core_api::OutputRendererPlugin> =
        Arc::from(factory::build_renderer(args.format.as_str(), args.ascii));
    let render_task = {
        let renderer = renderer.clone();
        tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                renderer.render(&event);
            }
        })
    };

    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, cancelling workflow");
                cancel.cancel();
            }
        })
    };

    let outcome = match job {
        Job::Execute(plan, options) => engine.execute_workflow(plan, options).await,
        Job::PlanAndExecute(request) => engine.plan_and_execute(request).await,
    };
    interrupt.abort();

    // Dropping the engine closes the event channel so the render task drains and ends.
    drop(engine);
    if let Err(e) = render_task.await {
        tracing::warn!(error.kind = "render.join", error.message = %e);
    }
    renderer.render_outcome(&outcome, args.expanded);

    Ok(exit_code_for_outcome(&outcome, cancel.is_cancelled()))
}

pub fn workflow_options(cfg: &AppConfig, args: &WorkflowArgs) -> WorkflowOptions {
    let mut options = WorkflowOptions::from_config(cfg);
    if let Some(worker) = &args.worker_agent {
        options.worker_agent = worker.clone();
    }
    if let Some(critic) = &args.critic_agent {
        options.critic_agent = critic.clone();
    }
    if let Some(n) = args.max_concurrency {
        options.max_concurrency = n;
    }
    if let Some(n) = args.max_worker_attempts {
        options.max_worker_attempts = n;
    }
    if args.no_fail_fast {
        options.fail_fast = false;
    }
    if let Some(scope) = args.agent_scope {
        options.agent_scope = scope.into();
    }
    if args.no_confirm_project_agents {
        options.confirm_project_agents = false;
    }
    options.execution_approved = args.yes;
    options
}

pub fn planning_options(cfg: &AppConfig, args: &PlanArgs) -> PlanningOptions {
    let mut options = PlanningOptions::from_config(cfg);
    if let Some(planner) = &args.planner_agent {
        options.planner_agent = planner.clone();
    }
    options.context = args.context.clone();
    options.constraints = args.constraints.clone();
    if let Some(n) = args.max_waves {
        options.max_waves = n;
    }
    if let Some(n) = args.max_tasks_per_wave {
        options.max_tasks_per_wave = n;
    }
    if let Some(n) = args.planning_attempts {
        options.planning_attempts = n;
    }
    options
}

/// 0 success, 1 failed or blocked tasks, 2 cancelled by the user.
pub fn exit_code_for_outcome(outcome: &WorkflowOutcome, interrupted: bool) -> i32 {
    if outcome.cancelled || interrupted {
        2
    } else if outcome.is_error {
        1
    } else {
        0
    }
}
