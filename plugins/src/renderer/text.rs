use wavecrew_core::events::WorkflowEvent;
use wavecrew_core::executor::OutputRendererPlugin;
use wavecrew_core::workflow::{TaskStatus, WorkflowDetails, WorkflowOutcome};

const COLLAPSED_TASK_LIMIT: usize = 8;

pub struct TextRendererPlugin {
    ascii_only: bool,
}

impl TextRendererPlugin {
    pub fn new(ascii_only: bool) -> Self {
        Self { ascii_only }
    }

    fn format_event(&self, event: &WorkflowEvent) -> String {
        match event {
            WorkflowEvent::RunStart {
                run_id,
                goal,
                total_waves,
                total_tasks,
            } => format!(
                "RUN START {} (waves: {}, tasks: {}) {}",
                run_id, total_waves, total_tasks, goal
            ),
            WorkflowEvent::WaveStart {
                wave_index,
                wave_name,
                task_ids,
            } => format!(
                "WAVE START {} {} (tasks: {})",
                wave_index + 1,
                wave_name,
                task_ids.join(", ")
            ),
            WorkflowEvent::Progress { message, .. } => format!("  {}", message),
            WorkflowEvent::TaskEnd { task } => {
                let mut line = format!(
                    "TASK END {} ({}, attempt {}, tools {})",
                    task.id, task.status, task.attempt, task.tool_calls
                );
                if let Some(err) = &task.error {
                    line.push_str(&format!(": {}", err));
                }
                line
            }
            WorkflowEvent::WaveEnd {
                wave_index,
                wave_name,
                counts,
            } => format!(
                "WAVE END {} {} (completed {}, blocked {}, failed {})",
                wave_index + 1,
                wave_name,
                counts.completed,
                counts.blocked,
                counts.failed
            ),
            WorkflowEvent::WavesSkipped {
                after_wave,
                task_ids,
            } => format!(
                "SKIPPED after wave {}: {}",
                after_wave + 1,
                task_ids.join(", ")
            ),
            WorkflowEvent::RunEnd {
                run_id,
                counts,
                usage,
                is_error,
            } => format!(
                "RUN END {} ({}, completed {}, blocked {}, failed {}, skipped {}) {}",
                run_id,
                if *is_error { "error" } else { "ok" },
                counts.completed,
                counts.blocked,
                counts.failed,
                counts.skipped,
                usage.summary_text()
            ),
        }
    }

    fn icon(&self, details: &WorkflowDetails) -> &'static str {
        let counts = details.counts();
        match (counts.failed > 0, counts.blocked > 0, self.ascii_only) {
            (true, _, true) => "FAIL",
            (true, _, false) => "✗",
            (false, true, true) => "PART",
            (false, true, false) => "◐",
            (false, false, true) => "OK",
            (false, false, false) => "✓",
        }
    }

    fn format_outcome(&self, outcome: &WorkflowOutcome, expanded: bool) -> String {
        let Some(details) = &outcome.details else {
            return outcome.text.clone();
        };

        let counts = details.counts();
        let mut lines = vec![
            format!(
                "{} workflow ({} -> {})",
                self.icon(details),
                details.worker_agent,
                details.critic_agent
            ),
            format!(
                "completed={} blocked={} failed={} skipped={}",
                counts.completed, counts.blocked, counts.failed, counts.skipped
            ),
        ];
        if let Some(planning) = &details.planning {
            lines.push(format!(
                "planner={} attempts={}",
                planning.planner_agent, planning.attempts
            ));
            lines.push(planning.usage.summary_text());
        }
        lines.push(String::new());

        if !expanded {
            for task in details.tasks.iter().take(COLLAPSED_TASK_LIMIT) {
                lines.push(format!(
                    "{:<14} {} (attempt {}/{})",
                    task.status.as_str(),
                    task.id,
                    task.attempt,
                    details.max_worker_attempts
                ));
            }
            if details.tasks.len() > COLLAPSED_TASK_LIMIT {
                lines.push(format!(
                    "... {} more (use --expanded)",
                    details.tasks.len() - COLLAPSED_TASK_LIMIT
                ));
            }
            lines.push(String::new());
            lines.push(outcome.text.clone());
            return lines.join("\n");
        }

        for task in &details.tasks {
            lines.push(format!("{}  [{}]  {}", task.id, task.wave_name, task.status));
            lines.push(format!("  objective: {}", task.objective));
            lines.push(format!(
                "  attempt: {}/{}  cwd: {}",
                task.attempt,
                details.max_worker_attempts,
                task.cwd.display()
            ));
            if let Some(summary) = &task.worker_summary {
                lines.push(format!("  summary: {}", summary));
            }
            if !task.files_touched.is_empty() {
                lines.push(format!("  files: {}", task.files_touched.join(", ")));
            }
            if !task.issues.is_empty() {
                lines.push(format!("  critic issues: {}", task.issues.join(" | ")));
            }
            if let Some(err) = &task.error {
                lines.push(format!("  error: {}", err));
            }
            if task.status != TaskStatus::Skipped && !task.usage.is_empty() {
                lines.push(format!("  usage: {}", task.usage.summary_text()));
            }
            lines.push(String::new());
        }
        lines.push(outcome.text.clone());
        lines.join("\n")
    }
}

impl OutputRendererPlugin for TextRendererPlugin {
    fn name(&self) -> &str {
        "text-renderer"
    }

    fn format(&self) -> &str {
        "text"
    }

    fn render(&self, event: &WorkflowEvent) {
        eprintln!("{}", self.format_event(event));
    }

    fn render_outcome(&self, outcome: &WorkflowOutcome, expanded: bool) {
        println!("{}", self.format_outcome(outcome, expanded));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::test_support::sample_outcome;
    use wavecrew_core::workflow::{StatusCounts, TaskRuntime, TaskSpec};

    #[test]
    fn task_end_line_carries_status_and_error() {
        let renderer = TextRendererPlugin::new(true);
        let spec = TaskSpec {
            id: "t1".to_string(),
            objective: "do it".to_string(),
            acceptance_criteria: vec!["done".to_string()],
            files: Vec::new(),
            constraints: Vec::new(),
            context: Vec::new(),
            cwd: None,
        };
        let mut task = TaskRuntime::new(&spec, 0, "Wave 1".to_string(), "/repo".into());
        task.status = TaskStatus::Failed;
        task.attempt = 2;
        task.error = Some("boom".to_string());

        let line = renderer.format_event(&WorkflowEvent::TaskEnd {
            task: Box::new(task),
        });
        assert_eq!(line, "TASK END t1 (failed, attempt 2, tools 0): boom");
    }

    #[test]
    fn wave_lines_are_one_based() {
        let renderer = TextRendererPlugin::new(true);
        let line = renderer.format_event(&WorkflowEvent::WaveEnd {
            wave_index: 0,
            wave_name: "Scaffold".to_string(),
            counts: StatusCounts {
                completed: 2,
                ..Default::default()
            },
        });
        assert_eq!(line, "WAVE END 1 Scaffold (completed 2, blocked 0, failed 0)");
    }

    #[test]
    fn collapsed_outcome_lists_task_table() {
        let renderer = TextRendererPlugin::new(true);
        let text = renderer.format_outcome(&sample_outcome(), false);
        assert!(text.starts_with("FAIL workflow (implementer -> critic)"));
        assert!(text.contains("completed=1 blocked=0 failed=1 skipped=0"));
        assert!(text.contains("completed      a (attempt 1/2)"));
        assert!(text.contains("failed         b (attempt 2/2)"));
        assert!(!text.contains("objective:"));
    }

    #[test]
    fn expanded_outcome_shows_task_details() {
        let renderer = TextRendererPlugin::new(false);
        let text = renderer.format_outcome(&sample_outcome(), true);
        assert!(text.starts_with("✗ workflow"));
        assert!(text.contains("b  [Wave 1]  failed"));
        assert!(text.contains("  critic issues: no tests | wrong name"));
        assert!(text.contains("  error: no tests; wrong name"));
    }

    #[test]
    fn outcome_without_details_is_plain_text() {
        let renderer = TextRendererPlugin::new(true);
        let outcome = WorkflowOutcome::error("Plan must contain at least one wave");
        assert_eq!(
            renderer.format_outcome(&outcome, false),
            "Plan must contain at least one wave"
        );
    }
}
