//! One-way progress notifications from the scheduler to whoever renders them.
use serde::Serialize;
use tokio::sync::mpsc;

use crate::usage::UsageSummary;
use crate::workflow::{StatusCounts, TaskRuntime};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    RunStart {
        run_id: String,
        goal: String,
        total_waves: usize,
        total_tasks: usize,
    },
    WaveStart {
        wave_index: usize,
        wave_name: String,
        task_ids: Vec<String>,
    },
    Progress {
        #[serde(skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
        message: String,
    },
    TaskEnd {
        task: Box<TaskRuntime>,
    },
    WaveEnd {
        wave_index: usize,
        wave_name: String,
        counts: StatusCounts,
    },
    WavesSkipped {
        after_wave: usize,
        task_ids: Vec<String>,
    },
    RunEnd {
        run_id: String,
        counts: StatusCounts,
        usage: UsageSummary,
        is_error: bool,
    },
}

impl WorkflowEvent {
    pub fn progress(task_id: Option<&str>, message: impl Into<String>) -> Self {
        WorkflowEvent::Progress {
            task_id: task_id.map(str::to_string),
            message: message.into(),
        }
    }
}

/// Sender half of the event stream. Sending never blocks and never fails the run;
/// a missing or closed receiver just drops events.
#[derive(Clone, Default)]
pub struct EventsTx {
    tx: Option<mpsc::UnboundedSender<WorkflowEvent>>,
}

impl EventsTx {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<WorkflowEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn send(&self, event: WorkflowEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let v = serde_json::to_value(WorkflowEvent::progress(Some("t1"), "Critic reviewing t1")).unwrap();
        assert_eq!(v["type"], "progress");
        assert_eq!(v["task_id"], "t1");
        assert_eq!(v["message"], "Critic reviewing t1");

        let v = serde_json::to_value(WorkflowEvent::progress(None, "Planner attempt 1/2")).unwrap();
        assert!(v.get("task_id").is_none());
    }

    #[tokio::test]
    async fn send_is_fire_and_forget() {
        let (tx, mut rx) = EventsTx::channel();
        tx.send(WorkflowEvent::progress(None, "one"));
        drop(rx.recv().await);
        drop(rx);
        // receiver gone: no panic, no error
        tx.send(WorkflowEvent::progress(None, "two"));
        EventsTx::disabled().send(WorkflowEvent::progress(None, "three"));
    }
}
