use futures::future::BoxFuture;
use tracing::warn;

use weft_core::error::Result;

use crate::graph::Node;
use crate::state::ExecutionState;

use super::{HandlerContext, NodeHandler};

/// Identity handler for node kinds this engine does not execute.
///
/// Forwards the current value unchanged and records a skip; an unknown kind
/// must never abort the run.
pub struct PassthroughHandler;

impl NodeHandler for PassthroughHandler {
    fn execute<'a>(
        &'a self,
        node: &'a Node,
        mut state: ExecutionState,
        _cx: &'a HandlerContext,
    ) -> BoxFuture<'a, Result<ExecutionState>> {
        Box::pin(async move {
            warn!(node_id = %node.id, kind = %node.kind.name(), "Unknown node kind, skipping");
            state.trace.push(format!(
                "Skipped (Unknown Type {} - {})",
                node.kind.name(),
                node.id
            ));
            Ok(state)
        })
    }
}
