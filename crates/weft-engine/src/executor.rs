use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use weft_core::config::EngineConfig;
use weft_core::error::{Result, WeftError};
use weft_core::traits::{ModelFactory, ToolCatalog};
use weft_core::types::RunId;

use crate::graph::Graph;
use crate::handlers::{
    agent::AgentHandler, input::InputHandler, llm::LanguageModelHandler, output::OutputHandler,
    passthrough::PassthroughHandler, HandlerContext, NodeHandler,
};
use crate::state::ExecutionState;

/// Result of executing an entire graph.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The final textual value.
    pub response: String,
    /// Ordered human-readable trace of the run.
    pub steps: Vec<String>,
    /// Set when traversal halted on a revisited node. The run still counts
    /// as completed; the response text carries the signal.
    pub cycle_detected: bool,
}

/// Walks a workflow graph from its input node to a terminal state.
///
/// The traversal is single-threaded cooperative: one node runs to completion
/// (including its network round-trips) before the next begins. Dispatch is a
/// kind→handler lookup; unknown kinds fall through to a passthrough handler.
pub struct GraphExecutor {
    handlers: HashMap<&'static str, Box<dyn NodeHandler>>,
    passthrough: Box<dyn NodeHandler>,
    cx: HandlerContext,
}

impl GraphExecutor {
    pub fn new(
        models: Arc<dyn ModelFactory>,
        catalog: Arc<dyn ToolCatalog>,
        config: EngineConfig,
    ) -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn NodeHandler>> = HashMap::new();
        handlers.insert("input", Box::new(InputHandler));
        handlers.insert("language_model", Box::new(LanguageModelHandler));
        handlers.insert("agent", Box::new(AgentHandler));
        handlers.insert("output", Box::new(OutputHandler));

        Self {
            handlers,
            passthrough: Box::new(PassthroughHandler),
            cx: HandlerContext {
                models,
                catalog,
                config,
                cancel: CancellationToken::new(),
            },
        }
    }

    /// Token for aborting in-flight runs.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cx.cancel.clone()
    }

    /// Execute the graph to completion.
    ///
    /// Returns `Ok` for every terminal condition the design treats as
    /// recoverable (output node, dangling edge, detected cycle) and `Err`
    /// only for validation, configuration, provider, and deadline failures.
    pub async fn execute(&self, graph: &Graph) -> Result<RunOutcome> {
        let run_id = RunId::new();
        let start = Instant::now();
        let deadline = self.cx.config.run_timeout_secs.map(Duration::from_secs);

        let (input_node, query) = graph.find_input_node()?;
        info!(run_id = %run_id, input_node = %input_node.id, "Starting graph execution");

        let mut state = ExecutionState::new(query);
        state.trace.push(format!("Start: Initial query = \"{}\"", query));
        state.current_node = Some(input_node.id.clone());

        loop {
            if self.cx.cancel.is_cancelled() {
                return Err(WeftError::Cancelled);
            }

            let Some(node_id) = state.current_node.clone() else {
                break;
            };
            if state.done {
                break;
            }

            // Controlled halt, not a crash: a revisited node means the graph
            // loops, so stop and report instead of walking forever.
            if state.visited.contains(&node_id) {
                warn!(run_id = %run_id, node_id = %node_id, "Cycle detected, terminating run");
                state.trace.push("Error: Infinite loop detected in graph.".to_string());
                return Ok(RunOutcome {
                    response: "Error: Infinite loop detected".to_string(),
                    steps: state.trace.into_steps(),
                    cycle_detected: true,
                });
            }
            state.visited.insert(node_id.clone());

            let node = graph.lookup(&node_id)?;
            info!(run_id = %run_id, node_id = %node.id, kind = %node.kind.name(), "Executing node");
            state
                .trace
                .push(format!("Executing: Node {} (Type: {})", node.id, node.kind.name()));

            let handler = self
                .handlers
                .get(node.kind.name())
                .unwrap_or(&self.passthrough);

            state = match deadline {
                Some(total) => {
                    let remaining = total.saturating_sub(start.elapsed());
                    tokio::time::timeout(remaining, handler.execute(node, state, &self.cx))
                        .await
                        .map_err(|_| {
                            WeftError::DeadlineExceeded(total.as_secs())
                        })??
                }
                None => handler.execute(node, state, &self.cx).await?,
            };

            if state.done {
                state.current_node = None;
                continue;
            }

            match graph.next_node(&node_id) {
                Some(next) => {
                    debug!(run_id = %run_id, next, "Following edge");
                    state.current_node = Some(next.to_string());
                }
                None => {
                    debug!(run_id = %run_id, node_id = %node_id, "No outgoing edge, run ends");
                    state
                        .trace
                        .push(format!("End: No outgoing edge from {}", node_id));
                    state.current_node = None;
                }
            }
        }

        info!(run_id = %run_id, elapsed_ms = start.elapsed().as_millis() as u64, "Graph execution finished");
        Ok(RunOutcome {
            response: state.current_text(),
            steps: state.trace.into_steps(),
            cycle_detected: false,
        })
    }
}
