pub mod agent;
pub mod input;
pub mod llm;
pub mod output;
pub mod passthrough;

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use weft_core::config::{EngineConfig, ModelConfig};
use weft_core::error::{Result, WeftError};
use weft_core::traits::{ModelFactory, ToolCatalog};

use crate::graph::Node;
use crate::state::ExecutionState;

/// Capabilities and knobs shared by every handler in a run.
pub struct HandlerContext {
    pub models: Arc<dyn ModelFactory>,
    pub catalog: Arc<dyn ToolCatalog>,
    pub config: EngineConfig,
    pub cancel: CancellationToken,
}

/// One handler per node kind.
///
/// A handler receives the execution state, does its work (including any
/// network round-trips), and hands the state back with its trace entries
/// appended. Handlers never see other nodes and never resolve successors.
pub trait NodeHandler: Send + Sync {
    fn execute<'a>(
        &'a self,
        node: &'a Node,
        state: ExecutionState,
        cx: &'a HandlerContext,
    ) -> BoxFuture<'a, Result<ExecutionState>>;
}

/// Two-part system prompt shared by model and agent nodes: a fixed framing
/// anchored on the run's original query, then the node's own instruction.
pub(crate) fn build_system_prompt(
    original_query: &str,
    current: &str,
    instruction: Option<&str>,
) -> String {
    let framing = format!(
        "Final Goal: {}\n\nCurrent Status/Input: {}",
        original_query, current
    );
    format!("{}\n\n{}", framing, instruction.unwrap_or(""))
        .trim()
        .to_string()
}

/// Model/agent nodes must carry a credential; a missing one aborts the run.
pub(crate) fn require_api_key(node_id: &str, api_key: Option<&str>) -> Result<String> {
    match api_key {
        Some(key) if !key.trim().is_empty() => Ok(key.to_string()),
        _ => Err(WeftError::Configuration(format!(
            "Node {} requires an api_key",
            node_id
        ))),
    }
}

/// Per-node model settings from an agent/model node's config.
pub(crate) fn model_config(provider: &str, model: &str, api_key: String) -> ModelConfig {
    ModelConfig {
        provider: provider.to_string(),
        model_id: model.to_string(),
        api_key: Some(api_key),
        base_url: None,
        max_tokens: 4096,
        temperature: 0.7,
    }
}
