use crate::util::truncate_for_prompt;

use super::types::TaskRuntime;

pub const WORKER_TASK_PROMPT: &str = "Execute the task now and return JSON only.";
pub const CRITIC_TASK_PROMPT: &str = "Review the worker output and return JSON only.";
pub const PLANNER_TASK_PROMPT: &str = "Create a wave-based plan now and return JSON only.";

const WORKER_SCHEMA: &str = r#"{"status":"completed|blocked","summary":"string","actions":["string"],"filesTouched":["string"],"blockers":["string"],"notes":["string"]}"#;
const CRITIC_SCHEMA: &str = r#"{"decision":"approve|revise","rationale":"string","issues":["string"],"revisionInstructions":["string"]}"#;
const PLANNER_SCHEMA: &str = r#"{"waves":[{"name":"string","tasks":[{"id":"string","objective":"string","acceptanceCriteria":["string"],"files":["string"],"constraints":["string"],"context":["string"],"cwd":"string"}]}]}"#;

fn bullets(items: &[String], fallback: &str) -> String {
    if items.is_empty() {
        return format!("- {fallback}");
    }
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_feedback(lines: &mut Vec<String>, heading: &str, feedback: &[String]) {
    if feedback.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(heading.to_string());
    lines.extend(feedback.iter().map(|item| format!("- {item}")));
}

/// Rules prompt followed by a blank line and the agent's own instructions.
pub fn compose_system_prompt(rules: &str, agent_instructions: &str) -> String {
    format!("{rules}\n\n{agent_instructions}")
}

pub fn build_worker_prompt(goal: &str, task: &TaskRuntime, revision_feedback: &[String]) -> String {
    let mut lines: Vec<String> = vec![
        "MANDATORY RULES (MUST FOLLOW EXACTLY):".into(),
        "1) You MUST execute only the provided task. Do NOT decompose into unrelated work.".into(),
        "2) You MUST honor every acceptance criterion and constraint.".into(),
        "3) You MUST return ONLY valid JSON with this schema:".into(),
        WORKER_SCHEMA.into(),
        "4) If acceptance criteria cannot be met, status MUST be \"blocked\" and blockers MUST explain why.".into(),
        "5) Do NOT include markdown, prose outside JSON, or code fences.".into(),
        String::new(),
        format!("GLOBAL GOAL: {goal}"),
        format!("TASK ID: {}", task.id),
        format!("TASK OBJECTIVE: {}", task.objective),
        format!("ACCEPTANCE CRITERIA: {}", bullets(&task.acceptance_criteria, "none")),
        format!("CONSTRAINTS: {}", bullets(&task.constraints, "none")),
        format!("FOCUS FILES: {}", bullets(&task.files, "none specified")),
        format!("TASK CONTEXT: {}", bullets(&task.context, "none")),
    ];
    push_feedback(
        &mut lines,
        "REVISION FEEDBACK FROM CRITIC (MUST ADDRESS):",
        revision_feedback,
    );
    lines.join("\n")
}

pub fn build_critic_prompt(
    goal: &str,
    task: &TaskRuntime,
    worker_output: &str,
    output_limit: usize,
) -> String {
    [
        "MANDATORY RULES (MUST FOLLOW EXACTLY):".to_string(),
        "1) You MUST evaluate worker output against objective, acceptance criteria, and constraints.".into(),
        "2) You MUST return ONLY valid JSON with this schema:".into(),
        CRITIC_SCHEMA.into(),
        "3) decision MUST be \"approve\" only when acceptance criteria are fully met.".into(),
        "4) If worker output is malformed or incomplete, decision MUST be \"revise\".".into(),
        "5) Do NOT include markdown, prose outside JSON, or code fences.".into(),
        String::new(),
        format!("GLOBAL GOAL: {goal}"),
        format!("TASK ID: {}", task.id),
        format!("TASK OBJECTIVE: {}", task.objective),
        format!("ACCEPTANCE CRITERIA: {}", bullets(&task.acceptance_criteria, "none")),
        format!("CONSTRAINTS: {}", bullets(&task.constraints, "none")),
        String::new(),
        "WORKER OUTPUT TO REVIEW:".into(),
        truncate_for_prompt(worker_output, output_limit),
    ]
    .join("\n")
}

pub fn build_planner_prompt(
    goal: &str,
    max_waves: usize,
    max_tasks_per_wave: usize,
    planning_context: &[String],
    planning_constraints: &[String],
    revision_feedback: &[String],
) -> String {
    let mut lines: Vec<String> = vec![
        "MANDATORY RULES (MUST FOLLOW EXACTLY):".into(),
        "1) You MUST return ONLY valid JSON. No markdown. No code fences.".into(),
        "2) Top-level output MUST match this schema exactly:".into(),
        PLANNER_SCHEMA.into(),
        "3) Every task MUST include id, objective, and at least one acceptance criterion.".into(),
        "4) Tasks inside the same wave MUST be independently executable in parallel.".into(),
        "5) Cross-task dependencies MUST be represented by later waves.".into(),
        format!(
            "6) You MUST return between 1 and {max_waves} waves, and each wave MUST have between 1 and {max_tasks_per_wave} tasks."
        ),
        String::new(),
        format!("GOAL: {goal}"),
        format!("PLANNING CONTEXT: {}", bullets(planning_context, "none")),
        format!("PLANNING CONSTRAINTS: {}", bullets(planning_constraints, "none")),
    ];
    push_feedback(&mut lines, "REVISION FEEDBACK (MUST FIX):", revision_feedback);
    lines.join("\n")
}
