use std::sync::Arc;

use futures::future::BoxFuture;

use crate::config::ModelConfig;
use crate::error::Result;
use crate::types::*;

/// Chat capability — one request, one complete response.
///
/// The response either carries a final text answer or a batch of tool calls
/// for the agent loop to dispatch. Authentication failures must surface as
/// `WeftError::Authentication` so the caller can distinguish them from other
/// provider errors.
pub trait ChatModel: Send + Sync + 'static {
    fn invoke(
        &self,
        config: &ModelConfig,
        messages: Vec<ChatMessage>,
        tools: &[ToolDefinition],
    ) -> BoxFuture<'_, Result<ChatResponse>>;
}

/// Creates a `ChatModel` for a provider name from a node's config.
pub trait ModelFactory: Send + Sync + 'static {
    fn create(&self, provider: &str) -> Arc<dyn ChatModel>;
}

/// Tool — a named external capability invocable with JSON arguments.
pub trait Tool: Send + Sync + 'static {
    /// Tool name (used in LLM tool calls).
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// JSON Schema for tool input.
    fn input_schema(&self) -> serde_json::Value;

    /// Execute the tool, returning its output as text.
    fn invoke(&self, args: serde_json::Value) -> BoxFuture<'_, Result<String>>;

    /// Timeout in seconds for this tool.
    fn timeout_secs(&self) -> u64 {
        30
    }
}

/// Tool catalog — resolves an agent node's allow-list into invocable tools.
///
/// Resolution failures are recoverable for the caller: an agent node degrades
/// to "no tools available" rather than aborting the run.
pub trait ToolCatalog: Send + Sync + 'static {
    fn resolve(
        &self,
        credential: &str,
        allow_list: &[String],
    ) -> BoxFuture<'_, Result<Vec<Arc<dyn Tool>>>>;
}
