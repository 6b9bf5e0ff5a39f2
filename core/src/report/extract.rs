use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref FENCE_RE: Regex =
        Regex::new(r"(?is)```(?:json)?\s*(.*?)```").expect("fence pattern is valid");
}

/// Recover a JSON value from free-form model output.
///
/// Candidates, first parse wins: the trimmed text, the contents of the first fenced
/// block, then the span from the first `{` to the last `}`.
pub fn extract_json_candidate(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    let mut candidates: Vec<&str> = vec![trimmed];

    if let Some(inner) = FENCE_RE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
    {
        candidates.push(inner);
    }

    if let (Some(first), Some(last)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if last > first {
            candidates.push(&trimmed[first..=last]);
        }
    }

    candidates
        .into_iter()
        .find_map(|candidate| serde_json::from_str::<Value>(candidate).ok())
}

/// Keep string entries only, trimmed, dropping empties. Anything that is not an array
/// becomes an empty list.
pub fn normalize_string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Trimmed non-empty string field.
pub(crate) fn non_empty_str<'a>(obj: &'a Value, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
