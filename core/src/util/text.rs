/// First `max` characters of `s`, cut on a char boundary.
pub fn preview_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Truncate text handed to another agent, marking how many characters were dropped.
pub fn truncate_for_prompt(text: &str, limit: usize) -> String {
    let total = text.chars().count();
    if total <= limit {
        return text.to_string();
    }
    format!(
        "{}\n\n[truncated {} characters]",
        preview_chars(text, limit),
        total - limit
    )
}
