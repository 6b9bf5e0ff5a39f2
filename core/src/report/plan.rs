use std::collections::HashSet;

use serde_json::Value;

use crate::workflow::{TaskSpec, WaveSpec};

use super::extract::{extract_json_candidate, non_empty_str, normalize_string_list};

/// Structure planner output into waves. Any violation rejects the whole plan.
pub fn parse_planned_waves(
    raw: &str,
    max_waves: usize,
    max_tasks_per_wave: usize,
) -> Option<Vec<WaveSpec>> {
    let json = extract_json_candidate(raw)?;
    let raw_waves = match &json {
        Value::Array(items) => items,
        Value::Object(_) => json.get("waves")?.as_array()?,
        _ => return None,
    };
    if raw_waves.is_empty() || raw_waves.len() > max_waves {
        return None;
    }

    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut waves = Vec::with_capacity(raw_waves.len());

    for (wave_index, raw_wave) in raw_waves.iter().enumerate() {
        if !raw_wave.is_object() {
            return None;
        }
        let raw_tasks = raw_wave.get("tasks")?.as_array()?;
        if raw_tasks.is_empty() || raw_tasks.len() > max_tasks_per_wave {
            return None;
        }

        let mut tasks = Vec::with_capacity(raw_tasks.len());
        for raw_task in raw_tasks {
            if !raw_task.is_object() {
                return None;
            }
            let id = non_empty_str(raw_task, "id")?.to_string();
            let objective = non_empty_str(raw_task, "objective")?.to_string();
            let acceptance_criteria = normalize_string_list(raw_task.get("acceptanceCriteria"));
            if acceptance_criteria.is_empty() || !seen_ids.insert(id.clone()) {
                return None;
            }

            tasks.push(TaskSpec {
                id,
                objective,
                acceptance_criteria,
                files: normalize_string_list(raw_task.get("files")),
                constraints: normalize_string_list(raw_task.get("constraints")),
                context: normalize_string_list(raw_task.get("context")),
                cwd: non_empty_str(raw_task, "cwd").map(str::to_string),
            });
        }

        let name = non_empty_str(raw_wave, "name")
            .map(str::to_string)
            .unwrap_or_else(|| format!("Wave {}", wave_index + 1));
        waves.push(WaveSpec {
            name: Some(name),
            tasks,
        });
    }

    Some(waves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn task(id: &str) -> Value {
        json!({"id": id, "objective": "do the thing", "acceptanceCriteria": ["it works"]})
    }

    #[test]
    fn accepts_wrapped_and_bare_wave_lists() {
        let wrapped = json!({"waves": [{"name": " Setup ", "tasks": [task("a")]}]}).to_string();
        let waves = parse_planned_waves(&wrapped, 6, 6).unwrap();
        assert_eq!(waves[0].name.as_deref(), Some("Setup"));

        let bare = json!([{"tasks": [task("a")]}, {"tasks": [task("b"), task("c")]}]).to_string();
        let waves = parse_planned_waves(&bare, 6, 6).unwrap();
        assert_eq!(waves.len(), 2);
        assert_eq!(waves[1].name.as_deref(), Some("Wave 2"));
        assert_eq!(waves[1].tasks.len(), 2);
    }

    #[test]
    fn optional_fields_only_when_non_empty() {
        let raw = json!({"waves": [{"tasks": [{
            "id": " t1 ",
            "objective": " build ",
            "acceptanceCriteria": ["passes", 7],
            "files": ["", "src/main.rs"],
            "constraints": [],
            "context": "not a list",
            "cwd": "  "
        }]}]})
        .to_string();

        let waves = parse_planned_waves(&raw, 6, 6).unwrap();
        let t = &waves[0].tasks[0];
        assert_eq!(
            t,
            &TaskSpec {
                id: "t1".into(),
                objective: "build".into(),
                acceptance_criteria: vec!["passes".into()],
                files: vec!["src/main.rs".into()],
                constraints: Vec::new(),
                context: Vec::new(),
                cwd: None,
            }
        );
    }

    #[test]
    fn enforces_bounds() {
        let two_waves = json!([{"tasks": [task("a")]}, {"tasks": [task("b")]}]).to_string();
        assert!(parse_planned_waves(&two_waves, 1, 6).is_none());

        let wide = json!([{"tasks": [task("a"), task("b"), task("c")]}]).to_string();
        assert!(parse_planned_waves(&wide, 6, 2).is_none());

        assert!(parse_planned_waves(r#"{"waves": []}"#, 6, 6).is_none());
        assert!(parse_planned_waves(r#"{"waves": [{"tasks": []}]}"#, 6, 6).is_none());
        assert!(parse_planned_waves(r#"{"plan": []}"#, 6, 6).is_none());
    }

    #[test]
    fn duplicate_id_anywhere_rejects_everything() {
        let raw = json!([{"tasks": [task("t1")]}, {"tasks": [task("t2"), task("t1")]}]).to_string();
        assert!(parse_planned_waves(&raw, 6, 6).is_none());
    }

    #[test]
    fn task_without_criteria_rejects_plan() {
        let raw = json!([{"tasks": [{"id": "x", "objective": "y", "acceptanceCriteria": [" "]}]}])
            .to_string();
        assert!(parse_planned_waves(&raw, 6, 6).is_none());
    }
}
