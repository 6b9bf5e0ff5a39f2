use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::extract::{extract_json_candidate, non_empty_str, normalize_string_list};

/// Feedback used when a revise decision carries nothing actionable.
pub const NO_REVISION_FEEDBACK: &str =
    "Critic requested a revision without specific feedback. Re-check every acceptance criterion.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriticDecision {
    Approve,
    Revise,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticReport {
    pub decision: CriticDecision,
    pub rationale: String,
    pub issues: Vec<String>,
    pub revision_instructions: Vec<String>,
}

impl CriticReport {
    pub fn parse(raw: &str) -> Option<Self> {
        let json = extract_json_candidate(raw)?;
        Self::from_value(&json)
    }

    pub fn from_value(json: &Value) -> Option<Self> {
        if !json.is_object() {
            return None;
        }
        let decision = match json.get("decision").and_then(Value::as_str) {
            Some("approve") => CriticDecision::Approve,
            Some("revise") => CriticDecision::Revise,
            _ => return None,
        };
        let rationale = non_empty_str(json, "rationale")?.to_string();

        Some(Self {
            decision,
            rationale,
            issues: normalize_string_list(json.get("issues")),
            revision_instructions: normalize_string_list(json.get("revisionInstructions")),
        })
    }

    /// Feedback for the next worker attempt: issues (or the rationale when there are
    /// none) followed by revision instructions. Never empty.
    pub fn revision_feedback(&self) -> Vec<String> {
        let mut feedback = if self.issues.is_empty() {
            vec![self.rationale.clone()]
        } else {
            self.issues.clone()
        };
        feedback.extend(self.revision_instructions.iter().cloned());
        feedback.retain(|item| !item.trim().is_empty());
        if feedback.is_empty() {
            feedback.push(NO_REVISION_FEEDBACK.to_string());
        }
        feedback
    }

    /// Error recorded when revisions run out.
    pub fn failure_reason(&self) -> String {
        if self.issues.is_empty() {
            self.rationale.clone()
        } else {
            self.issues.join("; ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_revise_with_feedback() {
        let report = CriticReport::parse(
            "```json\n{\"decision\":\"revise\",\"rationale\":\"incomplete\",\"issues\":[\"missing tests\"],\"revisionInstructions\":[\"add a unit test\"]}\n```",
        )
        .unwrap();
        assert_eq!(report.decision, CriticDecision::Revise);
        assert_eq!(
            report.revision_feedback(),
            vec!["missing tests", "add a unit test"]
        );
        assert_eq!(report.failure_reason(), "missing tests");
    }

    #[test]
    fn rationale_stands_in_for_missing_issues() {
        let report =
            CriticReport::parse(r#"{"decision":"revise","rationale":"does not compile"}"#).unwrap();
        assert_eq!(report.revision_feedback(), vec!["does not compile"]);
        assert_eq!(report.failure_reason(), "does not compile");
    }

    #[test]
    fn empty_feedback_is_replaced_with_a_generic_instruction() {
        let report = CriticReport {
            decision: CriticDecision::Revise,
            rationale: String::new(),
            issues: Vec::new(),
            revision_instructions: vec!["  ".into()],
        };
        assert_eq!(report.revision_feedback(), vec![NO_REVISION_FEEDBACK]);
    }

    #[test]
    fn rejects_unknown_decision_or_blank_rationale() {
        assert!(CriticReport::parse(r#"{"decision":"reject","rationale":"x"}"#).is_none());
        assert!(CriticReport::parse(r#"{"decision":"approve","rationale":""}"#).is_none());
        assert!(CriticReport::parse(r#"{"decision":"approve"}"#).is_none());
    }
}
