use serde_json::Value;

use crate::usage::UsageSummary;
use crate::util::preview_chars;

use super::types::{AgentProgress, ProgressPhase};

/// Incremental state built from an agent's line-JSON event stream.
#[derive(Debug, Default)]
pub struct AgentStreamState {
    pub messages: Vec<Value>,
    pub usage: UsageSummary,
    pub stop_reason: Option<String>,
    pub tool_calls: u64,
    preview_chars: usize,
}

impl AgentStreamState {
    pub fn new(preview_chars: usize) -> Self {
        Self {
            preview_chars,
            ..Default::default()
        }
    }

    /// Apply one stdout line. Blank and malformed lines are ignored.
    pub fn handle_line(&mut self, line: &str) -> Option<AgentProgress> {
        if line.trim().is_empty() {
            return None;
        }
        let payload: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(_) => return None,
        };

        match payload.get("type").and_then(Value::as_str) {
            Some("message_end") => {
                if let Some(message) = payload.get("message").filter(|m| !m.is_null()) {
                    self.record_message(message.clone());
                }
                None
            }
            Some("tool_execution_start") => {
                self.tool_calls += 1;
                let tool = payload
                    .get("toolName")
                    .and_then(Value::as_str)
                    .unwrap_or("tool");
                Some(AgentProgress {
                    phase: ProgressPhase::Tool,
                    text: format!("running {tool}"),
                })
            }
            Some("message_update") => {
                let event = payload.get("assistantMessageEvent")?;
                if event.get("type").and_then(Value::as_str) != Some("text_delta") {
                    return None;
                }
                let delta = event.get("delta").and_then(Value::as_str)?.trim();
                if delta.is_empty() {
                    return None;
                }
                Some(AgentProgress {
                    phase: ProgressPhase::Model,
                    text: preview_chars(delta, self.preview_chars).to_string(),
                })
            }
            _ => None,
        }
    }

    fn record_message(&mut self, message: Value) {
        if is_assistant(&message) {
            if let Some(usage) = message.get("usage").filter(|u| !u.is_null()) {
                self.usage += usage_from_wire(usage);
            }
            if let Some(reason) = message.get("stopReason").and_then(Value::as_str) {
                self.stop_reason = Some(reason.to_string());
            }
        }
        self.messages.push(message);
    }

    /// Text of the most recent assistant message that has any non-empty text part.
    pub fn final_text(&self) -> String {
        for message in self.messages.iter().rev() {
            if !is_assistant(message) {
                continue;
            }
            let parts: Vec<&str> = message
                .get("content")
                .and_then(Value::as_array)
                .map(|content| {
                    content
                        .iter()
                        .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
                        .filter_map(|part| part.get("text").and_then(Value::as_str))
                        .map(str::trim)
                        .filter(|text| !text.is_empty())
                        .collect()
                })
                .unwrap_or_default();
            if !parts.is_empty() {
                return parts.join("\n");
            }
        }
        String::new()
    }
}

fn is_assistant(message: &Value) -> bool {
    message.get("role").and_then(Value::as_str) == Some("assistant")
}

fn usage_from_wire(usage: &Value) -> UsageSummary {
    let count = |key: &str| usage.get(key).and_then(Value::as_u64).unwrap_or(0);
    UsageSummary {
        input: count("input"),
        output: count("output"),
        cache_read: count("cacheRead"),
        cache_write: count("cacheWrite"),
        total_tokens: count("totalTokens"),
        total_cost: usage
            .get("cost")
            .and_then(|c| c.get("total"))
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
        turns: 1,
    }
}
