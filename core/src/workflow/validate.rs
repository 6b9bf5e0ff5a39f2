use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use crate::config::{MAX_TASKS_PER_WAVE_CEILING, MAX_WAVES_CEILING};
use crate::error::PlanError;

use super::types::{TaskSpec, WorkflowPlan};

const GOAL_CHARS: (usize, usize) = (5, 3000);
const WAVE_NAME_MAX_CHARS: usize = 120;
const ID_CHARS: (usize, usize) = (1, 80);
const OBJECTIVE_CHARS: (usize, usize) = (5, 2000);
const ENTRY_CHARS: (usize, usize) = (1, 500);
const CWD_CHARS: (usize, usize) = (1, 500);
const MAX_CRITERIA: usize = 20;
const MAX_FILES: usize = 50;
const MAX_CONTEXT: usize = 20;
const MAX_CONSTRAINTS: usize = 20;

/// Enforce the wire-level bounds on a plan read from a file or another tool.
pub fn validate_plan(plan: &WorkflowPlan) -> Result<(), PlanError> {
    validate_goal(&plan.goal)?;

    if plan.waves.is_empty() {
        return Err(PlanError::EmptyPlan);
    }
    if plan.waves.len() > MAX_WAVES_CEILING {
        return Err(PlanError::TooManyWaves {
            count: plan.waves.len(),
            max: MAX_WAVES_CEILING,
        });
    }

    for (index, wave) in plan.waves.iter().enumerate() {
        let wave_no = index + 1;
        if let Some(name) = &wave.name {
            check_len(&format!("wave {wave_no} name"), name, (1, WAVE_NAME_MAX_CHARS))?;
        }
        if wave.tasks.is_empty() {
            return Err(PlanError::EmptyWave { wave: wave_no });
        }
        if wave.tasks.len() > MAX_TASKS_PER_WAVE_CEILING {
            return Err(PlanError::TooManyTasksInWave {
                wave: wave_no,
                count: wave.tasks.len(),
                max: MAX_TASKS_PER_WAVE_CEILING,
            });
        }
        for task in &wave.tasks {
            validate_task(task)?;
        }
    }

    Ok(())
}

pub fn validate_goal(goal: &str) -> Result<(), PlanError> {
    check_len("goal", goal, GOAL_CHARS)
}

fn validate_task(task: &TaskSpec) -> Result<(), PlanError> {
    check_len("task id", &task.id, ID_CHARS)?;
    let label = |field: &str| format!("task {} {field}", task.id);

    check_len(&label("objective"), &task.objective, OBJECTIVE_CHARS)?;
    if task.acceptance_criteria.is_empty() {
        return Err(PlanError::MissingAcceptanceCriteria {
            task: task.id.clone(),
        });
    }
    check_list(&label("acceptanceCriteria"), &task.acceptance_criteria, MAX_CRITERIA)?;
    check_list(&label("files"), &task.files, MAX_FILES)?;
    check_list(&label("context"), &task.context, MAX_CONTEXT)?;
    check_list(&label("constraints"), &task.constraints, MAX_CONSTRAINTS)?;
    if let Some(cwd) = &task.cwd {
        check_len(&label("cwd"), cwd, CWD_CHARS)?;
    }
    Ok(())
}

fn check_len(field: &str, value: &str, (min, max): (usize, usize)) -> Result<(), PlanError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(PlanError::FieldLength {
            field: field.to_string(),
            len,
            min,
            max,
        });
    }
    Ok(())
}

fn check_list(field: &str, values: &[String], max: usize) -> Result<(), PlanError> {
    if values.len() > max {
        return Err(PlanError::TooManyEntries {
            field: field.to_string(),
            count: values.len(),
            max,
        });
    }
    for value in values {
        check_len(field, value, ENTRY_CHARS)?;
    }
    Ok(())
}

/// Parse a plan document (`{"goal": ..., "waves": [...]}`) and check its wire bounds.
pub fn parse_plan_json(text: &str) -> Result<WorkflowPlan, PlanError> {
    let plan: WorkflowPlan =
        serde_json::from_str(text).map_err(|e| PlanError::InvalidJson(e.to_string()))?;
    validate_plan(&plan)?;
    Ok(plan)
}

/// Gate run inside every workflow before anything starts: total task ceiling and
/// plan-wide id uniqueness.
pub fn preflight(plan: &WorkflowPlan, max_tasks: usize) -> Result<(), PlanError> {
    let total = plan.total_tasks();
    if total > max_tasks {
        return Err(PlanError::TooManyTasks {
            count: total,
            max: max_tasks,
        });
    }

    let mut ids: HashSet<&str> = HashSet::new();
    for task in plan.waves.iter().flat_map(|w| w.tasks.iter()) {
        if !ids.insert(task.id.as_str()) {
            return Err(PlanError::DuplicateTaskId(task.id.clone()));
        }
    }
    Ok(())
}

/// Resolve a task's working directory against `root`. The result must stay inside
/// `root`; the check is lexical, symlinks are not followed.
pub fn resolve_task_cwd(root: &Path, requested: Option<&str>) -> Result<PathBuf, PlanError> {
    let base = normalize_lexically(&absolutize(root));
    let requested = match requested {
        Some(r) if !r.trim().is_empty() => r,
        _ => return Ok(base),
    };

    let candidate = Path::new(requested.trim());
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base.join(candidate)
    };
    let resolved = normalize_lexically(&joined);

    if resolved.starts_with(&base) {
        Ok(resolved)
    } else {
        Err(PlanError::CwdEscapesRoot(requested.to_string()))
    }
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
