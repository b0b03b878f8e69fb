//! Workflow graph execution.
//!
//! A graph is a set of typed nodes joined by directed edges. Execution
//! starts at the single input node and follows the first outgoing edge of
//! each node until an output node completes the run, an edge is missing,
//! or a node is revisited. Every step appends a human-readable line to the
//! run trace, which travels back to the caller alongside the final value.

pub mod executor;
pub mod graph;
pub mod handlers;
pub mod invoker;
pub mod state;

#[cfg(test)]
mod testing;

pub use executor::{GraphExecutor, RunOutcome};
pub use graph::{Edge, Graph, Node, NodeKind};
pub use state::ExecutionState;
