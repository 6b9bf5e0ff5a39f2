use chrono::Local;
use serde_json::{json, Value};

use wavecrew_core::events::WorkflowEvent;
use wavecrew_core::executor::OutputRendererPlugin;
use wavecrew_core::workflow::WorkflowOutcome;

/// One JSON object per line with a stable envelope: `v`, `event_type`, `ts`.
pub struct JsonlRendererPlugin {
    pretty_print: bool,
}

impl JsonlRendererPlugin {
    pub fn new(pretty_print: bool) -> Self {
        Self { pretty_print }
    }

    fn event_to_json(&self, event: &WorkflowEvent) -> Value {
        let ts = Local::now().to_rfc3339();
        match event {
            WorkflowEvent::RunStart {
                run_id,
                goal,
                total_waves,
                total_tasks,
            } => json!({
                "v": 1,
                "event_type": "run.start",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "goal": goal,
                    "total_waves": total_waves,
                    "total_tasks": total_tasks,
                }
            }),
            WorkflowEvent::WaveStart {
                wave_index,
                wave_name,
                task_ids,
            } => json!({
                "v": 1,
                "event_type": "wave.start",
                "ts": ts,
                "metadata": {
                    "wave_index": wave_index,
                    "wave_name": wave_name,
                    "tasks": task_ids,
                }
            }),
            WorkflowEvent::Progress { task_id, message } => json!({
                "v": 1,
                "event_type": "workflow.progress",
                "ts": ts,
                "task_id": task_id,
                "metadata": {
                    "message": message,
                }
            }),
            WorkflowEvent::TaskEnd { task } => json!({
                "v": 1,
                "event_type": "task.end",
                "ts": ts,
                "task_id": task.id,
                "metadata": {
                    "status": task.status,
                    "attempt": task.attempt,
                    "wave_index": task.wave_index,
                    "tool_calls": task.tool_calls,
                    "error": task.error,
                    "usage": task.usage,
                }
            }),
            WorkflowEvent::WaveEnd {
                wave_index,
                wave_name,
                counts,
            } => json!({
                "v": 1,
                "event_type": "wave.end",
                "ts": ts,
                "metadata": {
                    "wave_index": wave_index,
                    "wave_name": wave_name,
                    "counts": counts,
                }
            }),
            WorkflowEvent::WavesSkipped {
                after_wave,
                task_ids,
            } => json!({
                "v": 1,
                "event_type": "wave.skipped",
                "ts": ts,
                "metadata": {
                    "after_wave": after_wave,
                    "tasks": task_ids,
                }
            }),
            WorkflowEvent::RunEnd {
                run_id,
                counts,
                usage,
                is_error,
            } => json!({
                "v": 1,
                "event_type": "run.end",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "counts": counts,
                    "usage": usage,
                    "is_error": is_error,
                }
            }),
        }
    }

    fn outcome_to_json(&self, outcome: &WorkflowOutcome, expanded: bool) -> Value {
        let mut value = json!({
            "v": 1,
            "event_type": "run.outcome",
            "ts": Local::now().to_rfc3339(),
            "text": outcome.text,
            "is_error": outcome.is_error,
            "cancelled": outcome.cancelled,
        });
        if let Some(details) = &outcome.details {
            value["counts"] = json!(details.counts());
            value["usage"] = json!(details.usage());
            if expanded {
                value["details"] = serde_json::to_value(details).unwrap_or(Value::Null);
            }
        }
        value
    }

    fn print(&self, value: &Value) {
        if self.pretty_print {
            println!("{}", serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".into()));
        } else {
            println!("{}", serde_json::to_string(value).unwrap_or_else(|_| "{}".into()));
        }
    }
}

impl OutputRendererPlugin for JsonlRendererPlugin {
    fn name(&self) -> &str {
        "jsonl-renderer"
    }

    fn format(&self) -> &str {
        "jsonl"
    }

    fn render(&self, event: &WorkflowEvent) {
        self.print(&self.event_to_json(event));
    }

    fn render_outcome(&self, outcome: &WorkflowOutcome, expanded: bool) {
        self.print(&self.outcome_to_json(outcome, expanded));
    }
}
