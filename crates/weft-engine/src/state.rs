use std::collections::HashSet;

/// Append-only ordered list of human-readable step descriptions, returned to
/// the caller alongside the final value.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    entries: Vec<String>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn into_steps(self) -> Vec<String> {
        self.entries
    }
}

/// Per-run execution state, threaded through each node handler.
#[derive(Debug)]
pub struct ExecutionState {
    /// The user's original query; immutable once seeded, reused as the
    /// high-level goal framing for every model call in the run.
    pub original_query: String,
    /// Whatever the last node produced — a string for most nodes, but
    /// structured values pass through untouched.
    pub current_value: serde_json::Value,
    pub current_node: Option<String>,
    pub visited: HashSet<String>,
    pub trace: Trace,
    pub done: bool,
}

impl ExecutionState {
    pub fn new(original_query: impl Into<String>) -> Self {
        let original_query = original_query.into();
        Self {
            current_value: serde_json::Value::String(original_query.clone()),
            original_query,
            current_node: None,
            visited: HashSet::new(),
            trace: Trace::new(),
            done: false,
        }
    }

    /// The current value rendered as text, the way it feeds model prompts
    /// and the final response.
    pub fn current_text(&self) -> String {
        value_text(&self.current_value)
    }
}

/// Render a payload value as text: strings verbatim, anything else as JSON.
pub fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Truncated preview of a value for trace entries.
pub fn preview(text: &str) -> String {
    const MAX: usize = 100;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let head: String = text.chars().take(MAX).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_seeds_value_from_query() {
        let state = ExecutionState::new("find flights");
        assert_eq!(state.original_query, "find flights");
        assert_eq!(state.current_text(), "find flights");
        assert!(!state.done);
        assert!(state.visited.is_empty());
    }

    #[test]
    fn test_value_text_structured() {
        assert_eq!(value_text(&serde_json::json!("plain")), "plain");
        assert_eq!(value_text(&serde_json::json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn test_preview_truncates_long_text() {
        let long = "x".repeat(150);
        let p = preview(&long);
        assert_eq!(p.chars().count(), 103);
        assert!(p.ends_with("..."));
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_trace_preserves_order() {
        let mut trace = Trace::new();
        trace.push("first");
        trace.push("second");
        assert_eq!(trace.into_steps(), vec!["first", "second"]);
    }
}
