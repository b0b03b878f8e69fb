use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::warn;

use weft_core::traits::Tool;
use weft_core::types::{ToolCall, ToolResult};

/// Execute one tool call and normalize every outcome into a `ToolResult`.
///
/// Failures here are local to the call: a parse error, an unknown name, a
/// tool error, or a timeout all become `is_error` results fed back to the
/// model, never run-level errors. The caller relies on getting exactly one
/// result per call regardless of what went wrong.
///
/// `timeout_cap_secs` bounds the per-call timeout; tools declaring a shorter
/// one keep it.
pub async fn invoke_call(
    tools: &HashMap<String, Arc<dyn Tool>>,
    call: &ToolCall,
    timeout_cap_secs: u64,
) -> ToolResult {
    let Some(tool) = tools.get(&call.name) else {
        warn!(tool = %call.name, "Tool requested but not found");
        return ToolResult::error(format!("Error: Tool \"{}\" not found.", call.name));
    };

    // An absent payload means "no arguments"
    let raw = call.arguments.trim();
    let args: serde_json::Value = if raw.is_empty() {
        serde_json::json!({})
    } else {
        match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(_) => {
                warn!(tool = %call.name, "Malformed tool arguments");
                return ToolResult::error(format!(
                    "Error executing tool: Invalid arguments format: {}",
                    call.arguments
                ));
            }
        }
    };

    let timeout = Duration::from_secs(tool.timeout_secs().min(timeout_cap_secs));
    // Tools run model-controlled input, so a panic inside one is contained
    // here and fed back as an error result like any other tool failure.
    let fut = std::panic::AssertUnwindSafe(tool.invoke(args)).catch_unwind();
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(Ok(output))) => ToolResult::success(output),
        Ok(Ok(Err(e))) => {
            warn!(tool = %call.name, error = %e, "Tool execution failed");
            ToolResult::error(format!("Error executing tool: {}", e))
        }
        Ok(Err(_)) => {
            warn!(tool = %call.name, "Tool panicked");
            ToolResult::error(format!("Error executing tool: {} panicked", call.name))
        }
        Err(_) => {
            warn!(tool = %call.name, "Tool timed out");
            ToolResult::error(format!(
                "Error executing tool: timed out after {}s",
                timeout.as_secs()
            ))
        }
    }
}
