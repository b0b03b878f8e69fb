use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use weft_core::error::{Result, WeftError};
use weft_core::traits::Tool;
use weft_core::types::{ChatMessage, ContentBlock, ToolDefinition};

use crate::graph::{AgentNodeConfig, Node, NodeKind};
use crate::invoker;
use crate::state::{preview, ExecutionState};

use super::{build_system_prompt, model_config, require_api_key, HandlerContext, NodeHandler};

/// Fixed fallback when the turn cap is reached and no usable message remains.
const MAX_ITERATIONS_FALLBACK: &str = "Agent reached max iterations";

/// The bounded reason → call tools → observe loop.
///
/// Each turn asks the model once; a batch of requested tool calls is
/// dispatched concurrently and the turn proceeds only once every call has a
/// correlated result. Tool failures stay inside the turn as error results;
/// only configuration and provider errors abort the run.
pub struct AgentHandler;

impl NodeHandler for AgentHandler {
    fn execute<'a>(
        &'a self,
        node: &'a Node,
        mut state: ExecutionState,
        cx: &'a HandlerContext,
    ) -> BoxFuture<'a, Result<ExecutionState>> {
        Box::pin(async move {
            let NodeKind::Agent(config) = &node.kind else {
                return Err(WeftError::Configuration(format!(
                    "agent handler dispatched to node {} of kind {}",
                    node.id,
                    node.kind.name()
                )));
            };

            let api_key = require_api_key(&node.id, config.api_key.as_deref())?;
            let tools = resolve_tools(node, config, cx, &mut state).await;
            let definitions: Vec<ToolDefinition> = tools
                .values()
                .map(|t| ToolDefinition {
                    name: t.name().to_string(),
                    description: t.description().to_string(),
                    input_schema: t.input_schema(),
                })
                .collect();

            let current = state.current_text();
            let system = build_system_prompt(
                &state.original_query,
                &current,
                config.instruction.as_deref(),
            );
            let mut messages = vec![ChatMessage::system(system), ChatMessage::user(&current)];

            let model = cx.models.create(&config.provider);
            let model_cfg = model_config(&config.provider, &config.model, api_key);
            let max_turns = cx.config.max_turns;
            let mut final_output: Option<String> = None;

            for turn in 1..=max_turns {
                state
                    .trace
                    .push(format!("Agent {} Turn {}: Calling LLM", node.id, turn));
                debug!(node_id = %node.id, turn, "Invoking agent model");

                let response = tokio::select! {
                    result = model.invoke(&model_cfg, messages.clone(), &definitions) => result?,
                    _ = cx.cancel.cancelled() => return Err(WeftError::Cancelled),
                };

                let content = response.content.clone();
                let tool_calls = response.tool_calls.clone();
                messages.push(response.into_message());

                // A final answer, or nothing to call tools with
                if tool_calls.is_empty() || tools.is_empty() {
                    state.trace.push(format!(
                        "Result (Agent {}): {}",
                        node.id,
                        preview(&content)
                    ));
                    final_output = Some(content);
                    break;
                }

                let names: Vec<&str> = tool_calls.iter().map(|c| c.name.as_str()).collect();
                state.trace.push(format!(
                    "Agent {} Turn {}: LLM requested tools: {}",
                    node.id,
                    turn,
                    names.join(", ")
                ));

                // Fan-out: every requested call runs concurrently; the turn
                // blocks until all of them have resolved.
                let timeout_cap = cx.config.tool_timeout_secs;
                let futs = tool_calls.iter().map(|call| {
                    let tools = &tools;
                    async move { (call.id.clone(), invoker::invoke_call(tools, call, timeout_cap).await) }
                });
                let mut results: HashMap<_, _> =
                    futures::future::join_all(futs).await.into_iter().collect();

                // Fan-in: append one correlated result per originating call,
                // in request order.
                for call in &tool_calls {
                    let result = results.remove(&call.id).unwrap_or_else(|| {
                        // Unreachable while ids are unique; a duplicated id
                        // still gets a response message rather than a hole.
                        weft_core::types::ToolResult::error(format!(
                            "Error executing tool: no result for call {}",
                            call.id
                        ))
                    });
                    if result.is_error {
                        state.trace.push(format!(
                            "Agent {} Turn {}: {}",
                            node.id,
                            turn,
                            preview(&result.content)
                        ));
                    } else {
                        state.trace.push(format!(
                            "Agent {} Turn {}: Executed {}. Result: {}",
                            node.id,
                            turn,
                            call.name,
                            preview(&result.content)
                        ));
                    }
                    messages.push(ChatMessage::tool_result(
                        &call.id,
                        result.content,
                        result.is_error,
                    ));
                }
            }

            let output = match final_output {
                Some(output) => output,
                None => {
                    // Cap reached without a final answer: recoverable, never fatal
                    warn!(node_id = %node.id, max_turns, "Agent reached max iterations");
                    state.trace.push(format!(
                        "Warning (Agent {}): Reached max iterations after tool calls.",
                        node.id
                    ));
                    let last = messages.last().map(message_fallback_text).unwrap_or_default();
                    if last.is_empty() {
                        MAX_ITERATIONS_FALLBACK.to_string()
                    } else {
                        last
                    }
                }
            };

            info!(node_id = %node.id, "Agent node complete");
            state.current_value = serde_json::Value::String(output);
            Ok(state)
        })
    }
}

/// Resolve the node's allow-list into invocable tools, keyed by name.
///
/// Failures degrade to an empty set with a warning trace entry; the agent
/// then runs tool-less instead of failing the run.
async fn resolve_tools(
    node: &Node,
    config: &AgentNodeConfig,
    cx: &HandlerContext,
    state: &mut ExecutionState,
) -> HashMap<String, Arc<dyn Tool>> {
    let allow_list = config.allow_list();
    let Some(tool_key) = config.tool_key.as_deref().filter(|k| !k.trim().is_empty()) else {
        debug!(node_id = %node.id, "No tool credential, agent runs tool-less");
        return HashMap::new();
    };
    if allow_list.is_empty() {
        debug!(node_id = %node.id, "Empty tool allow-list, agent runs tool-less");
        return HashMap::new();
    }

    match cx.catalog.resolve(tool_key, &allow_list).await {
        Ok(tools) => {
            debug!(node_id = %node.id, count = tools.len(), "Loaded agent tools");
            tools
                .into_iter()
                .map(|t| (t.name().to_string(), t))
                .collect()
        }
        Err(e) => {
            warn!(node_id = %node.id, error = %e, "Failed to load tools");
            state.trace.push(format!(
                "Warning (Agent {}): Failed to load tools - {}",
                node.id, e
            ));
            HashMap::new()
        }
    }
}

/// Text to fall back on from the last history message: plain text if any,
/// else the content of its tool results.
fn message_fallback_text(msg: &ChatMessage) -> String {
    let text = msg.text();
    if !text.is_empty() {
        return text;
    }
    msg.content
        .iter()
        .filter_map(|b| match b {
            ContentBlock::ToolResult { content, .. } => Some(content.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
