use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::extract::{extract_json_candidate, non_empty_str, normalize_string_list};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Completed,
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerReport {
    pub status: WorkerStatus,
    pub summary: String,
    pub actions: Vec<String>,
    pub files_touched: Vec<String>,
    pub blockers: Vec<String>,
    pub notes: Vec<String>,
}

impl WorkerReport {
    pub fn parse(raw: &str) -> Option<Self> {
        let json = extract_json_candidate(raw)?;
        Self::from_value(&json)
    }

    pub fn from_value(json: &Value) -> Option<Self> {
        if !json.is_object() {
            return None;
        }
        let status = match json.get("status").and_then(Value::as_str) {
            Some("completed") => WorkerStatus::Completed,
            Some("blocked") => WorkerStatus::Blocked,
            _ => return None,
        };
        let summary = non_empty_str(json, "summary")?.to_string();

        Some(Self {
            status,
            summary,
            actions: normalize_string_list(json.get("actions")),
            files_touched: normalize_string_list(json.get("filesTouched")),
            blockers: normalize_string_list(json.get("blockers")),
            notes: normalize_string_list(json.get("notes")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_report_with_defaults() {
        let report = WorkerReport::parse(r#"{"status":"completed","summary":" ok "}"#).unwrap();
        assert_eq!(report.status, WorkerStatus::Completed);
        assert_eq!(report.summary, "ok");
        assert!(report.actions.is_empty());
        assert!(report.files_touched.is_empty());
    }

    #[test]
    fn coerces_list_fields() {
        let report = WorkerReport::parse(
            r#"{"status":"blocked","summary":"stuck","blockers":["no access", 1, " "],"filesTouched":"src/lib.rs"}"#,
        )
        .unwrap();
        assert_eq!(report.status, WorkerStatus::Blocked);
        assert_eq!(report.blockers, vec!["no access"]);
        assert!(report.files_touched.is_empty());
    }

    #[test]
    fn rejects_bad_status_or_missing_summary() {
        assert!(WorkerReport::parse(r#"{"status":"done","summary":"ok"}"#).is_none());
        assert!(WorkerReport::parse(r#"{"status":"COMPLETED","summary":"ok"}"#).is_none());
        assert!(WorkerReport::parse(r#"{"status":"completed","actions":["a"]}"#).is_none());
        assert!(WorkerReport::parse(r#"{"status":"completed","summary":"   "}"#).is_none());
        assert!(WorkerReport::parse(r#"["completed"]"#).is_none());
        assert!(WorkerReport::parse("plain prose").is_none());
    }
}
