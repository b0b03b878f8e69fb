use futures::future::BoxFuture;
use serde::Deserialize;

use weft_core::error::{Result, WeftError};
use weft_core::traits::Tool;

// ── JsonQueryTool ───────────────────────────────────────────────

pub struct JsonQueryTool;

#[derive(Deserialize)]
struct JsonQueryInput {
    json: String,
    path: String,
}

impl Tool for JsonQueryTool {
    fn name(&self) -> &str {
        "json_query"
    }
    fn description(&self) -> &str {
        "Query a JSON value by dot-notation path (e.g. 'foo.bar[0].baz')."
    }
    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "json": { "type": "string", "description": "JSON string to query" },
                "path": { "type": "string", "description": "Dot-notation path (e.g. 'items[0].name')" }
            },
            "required": ["json", "path"]
        })
    }
    fn invoke(&self, input: serde_json::Value) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            let p: JsonQueryInput = serde_json::from_value(input).map_err(|e| {
                WeftError::ToolExecution {
                    tool: "json_query".into(),
                    message: e.to_string(),
                }
            })?;
            let value: serde_json::Value =
                serde_json::from_str(&p.json).map_err(|e| WeftError::ToolExecution {
                    tool: "json_query".into(),
                    message: format!("Invalid JSON: {}", e),
                })?;
            let result = json_path_query(&value, &p.path);
            Ok(serde_json::to_string_pretty(&result).unwrap_or_else(|_| "null".into()))
        })
    }
}

fn json_path_query(value: &serde_json::Value, path: &str) -> serde_json::Value {
    let mut current = value.clone();
    for segment in path.split('.') {
        if segment.is_empty() {
            continue;
        }
        // Check for array index: key[0]. The path is model-supplied, so a
        // malformed segment resolves to Null rather than failing the parse.
        if let Some(bracket_pos) = segment.find('[') {
            let key = &segment[..bracket_pos];
            let idx = segment[bracket_pos + 1..]
                .strip_suffix(']')
                .and_then(|s| s.parse::<usize>().ok());
            if !key.is_empty() {
                current = current.get(key).cloned().unwrap_or(serde_json::Value::Null);
            }
            current = match idx {
                Some(idx) => current.get(idx).cloned().unwrap_or(serde_json::Value::Null),
                None => serde_json::Value::Null,
            };
        } else {
            current = current
                .get(segment)
                .cloned()
                .unwrap_or(serde_json::Value::Null);
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_query_nested_path() {
        let output = JsonQueryTool
            .invoke(serde_json::json!({
                "json": r#"{"items":[{"name":"first"}]}"#,
                "path": "items[0].name",
            }))
            .await
            .unwrap();
        assert!(output.contains("first"));
    }

    #[tokio::test]
    async fn test_json_query_unterminated_bracket_resolves_null() {
        let output = JsonQueryTool
            .invoke(serde_json::json!({
                "json": r#"{"a":[1,2]}"#,
                "path": "a[",
            }))
            .await
            .unwrap();
        assert_eq!(output, "null");
    }

    #[tokio::test]
    async fn test_json_query_non_numeric_index_resolves_null() {
        let output = JsonQueryTool
            .invoke(serde_json::json!({
                "json": r#"{"a":[1,2]}"#,
                "path": "a[x]",
            }))
            .await
            .unwrap();
        assert_eq!(output, "null");
    }

    #[tokio::test]
    async fn test_json_query_invalid_json_is_error() {
        let err = JsonQueryTool
            .invoke(serde_json::json!({ "json": "{not json", "path": "a" }))
            .await
            .unwrap_err();
        assert!(matches!(err, WeftError::ToolExecution { .. }));
    }
}
