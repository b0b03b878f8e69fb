use futures::future::BoxFuture;
use tracing::info;

use weft_core::error::Result;

use crate::graph::Node;
use crate::state::{preview, ExecutionState};

use super::{HandlerContext, NodeHandler};

/// Terminal by construction: records the final value and completes the run,
/// regardless of any further edges in the graph.
pub struct OutputHandler;

impl NodeHandler for OutputHandler {
    fn execute<'a>(
        &'a self,
        node: &'a Node,
        mut state: ExecutionState,
        _cx: &'a HandlerContext,
    ) -> BoxFuture<'a, Result<ExecutionState>> {
        Box::pin(async move {
            let text = state.current_text();
            info!(node_id = %node.id, "Reached output node");
            state.trace.push(format!("Output: {}", preview(&text)));
            state.done = true;
            Ok(state)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{output_node, test_context};

    #[tokio::test]
    async fn test_output_marks_done() {
        let cx = test_context();
        let node = output_node("out");
        let mut state = ExecutionState::new("hi");
        state.current_value = serde_json::json!("final value");

        let state = OutputHandler.execute(&node, state, &cx).await.unwrap();
        assert!(state.done);
        assert_eq!(state.trace.entries(), ["Output: final value"]);
        assert_eq!(state.current_text(), "final value");
    }
}
