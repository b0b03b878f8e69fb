use futures::future::BoxFuture;

use weft_core::error::{Result, WeftError};

use crate::graph::{Node, NodeKind};
use crate::state::{preview, ExecutionState};

use super::{HandlerContext, NodeHandler};

/// Seeds the run's value with the node's configured query.
pub struct InputHandler;

impl NodeHandler for InputHandler {
    fn execute<'a>(
        &'a self,
        node: &'a Node,
        mut state: ExecutionState,
        _cx: &'a HandlerContext,
    ) -> BoxFuture<'a, Result<ExecutionState>> {
        Box::pin(async move {
            let NodeKind::Input(config) = &node.kind else {
                return Err(WeftError::Configuration(format!(
                    "input handler dispatched to node {} of kind {}",
                    node.id,
                    node.kind.name()
                )));
            };

            let query = config.query.trim().to_string();
            state
                .trace
                .push(format!("Input ({}): {}", node.id, preview(&query)));
            state.current_value = serde_json::Value::String(query);
            Ok(state)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_context, input_node};

    #[tokio::test]
    async fn test_input_sets_current_value() {
        let cx = test_context();
        let node = input_node("in", "  find flights  ");
        let state = ExecutionState::new("find flights");

        let state = InputHandler.execute(&node, state, &cx).await.unwrap();
        assert_eq!(state.current_text(), "find flights");
        assert_eq!(state.trace.entries().len(), 1);
    }
}
