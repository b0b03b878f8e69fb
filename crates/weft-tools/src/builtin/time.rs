use std::fmt::Write as _;

use chrono::Utc;
use futures::future::BoxFuture;
use serde::Deserialize;

use weft_core::error::{Result, WeftError};
use weft_core::traits::Tool;

// ── CurrentTimeTool ─────────────────────────────────────────────

pub struct CurrentTimeTool;

#[derive(Deserialize)]
struct CurrentTimeInput {
    #[serde(default)]
    format: Option<String>,
}

impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "current_time"
    }
    fn description(&self) -> &str {
        "Get the current UTC date and time, optionally with a strftime format."
    }
    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "format": { "type": "string", "description": "strftime format (default: RFC 3339)" }
            }
        })
    }
    fn invoke(&self, input: serde_json::Value) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            let p: CurrentTimeInput = serde_json::from_value(input).unwrap_or(CurrentTimeInput {
                format: None,
            });
            let now = Utc::now();
            Ok(match p.format {
                Some(fmt) => {
                    // format() defers validation to Display, so render through
                    // write! to surface a bad strftime string as an error.
                    let mut out = String::new();
                    write!(out, "{}", now.format(&fmt)).map_err(|_| {
                        WeftError::ToolExecution {
                            tool: "current_time".into(),
                            message: format!("Invalid format string: {}", fmt),
                        }
                    })?;
                    out
                }
                None => now.to_rfc3339(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_current_time_default_format() {
        let output = CurrentTimeTool
            .invoke(serde_json::json!({}))
            .await
            .unwrap();
        // RFC 3339 always carries a date separator
        assert!(output.contains('-'));
        assert!(output.contains('T'));
    }

    #[tokio::test]
    async fn test_current_time_custom_format() {
        let output = CurrentTimeTool
            .invoke(serde_json::json!({ "format": "%Y" }))
            .await
            .unwrap();
        assert_eq!(output.len(), 4);
    }

    #[tokio::test]
    async fn test_current_time_invalid_format_is_error() {
        let err = CurrentTimeTool
            .invoke(serde_json::json!({ "format": "%" }))
            .await
            .unwrap_err();
        assert!(matches!(err, WeftError::ToolExecution { .. }));
    }
}
