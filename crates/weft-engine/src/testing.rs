//! Deterministic mocks shared by the engine's unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use weft_core::config::{EngineConfig, ModelConfig};
use weft_core::error::{Result, WeftError};
use weft_core::traits::{ChatModel, ModelFactory, Tool, ToolCatalog};
use weft_core::types::{ChatMessage, ChatResponse, ToolDefinition};

use crate::graph::{
    AgentNodeConfig, Edge, Graph, InputConfig, ModelNodeConfig, Node, NodeKind,
};
use crate::handlers::HandlerContext;

// ── Scripted chat model ─────────────────────────────────────────

/// Replays a fixed sequence of responses and records every invocation.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Result<ChatResponse>>>,
    calls: AtomicUsize,
    recorded: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<Result<ChatResponse>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            calls: AtomicUsize::new(0),
            recorded: Mutex::new(Vec::new()),
        }
    }

    /// Number of invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Message history the model received on invocation `index`.
    pub fn messages_of_call(&self, index: usize) -> Vec<ChatMessage> {
        self.recorded.lock().unwrap()[index].clone()
    }
}

impl ChatModel for ScriptedModel {
    fn invoke(
        &self,
        _config: &ModelConfig,
        messages: Vec<ChatMessage>,
        _tools: &[ToolDefinition],
    ) -> BoxFuture<'_, Result<ChatResponse>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.recorded.lock().unwrap().push(messages);
        let next = self.responses.lock().unwrap().pop_front();
        Box::pin(async move { next.unwrap_or_else(|| Ok(ChatResponse::text("out of script"))) })
    }
}

/// A model whose request never completes.
pub struct HangingModel;

impl ChatModel for HangingModel {
    fn invoke(
        &self,
        _config: &ModelConfig,
        _messages: Vec<ChatMessage>,
        _tools: &[ToolDefinition],
    ) -> BoxFuture<'_, Result<ChatResponse>> {
        Box::pin(async move {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            Ok(ChatResponse::text("too late"))
        })
    }
}

/// Hands out the same model regardless of provider name.
pub struct FixedFactory {
    model: Arc<dyn ChatModel>,
}

impl FixedFactory {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

impl ModelFactory for FixedFactory {
    fn create(&self, _provider: &str) -> Arc<dyn ChatModel> {
        self.model.clone()
    }
}

// ── Mock catalog and tools ──────────────────────────────────────

/// Resolves allow-listed names against a fixed tool set, or fails outright.
pub struct MockCatalog {
    tools: Vec<Arc<dyn Tool>>,
    fail: bool,
}

impl MockCatalog {
    pub fn with_tools(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { tools, fail: false }
    }

    pub fn failing() -> Self {
        Self {
            tools: Vec::new(),
            fail: true,
        }
    }
}

impl ToolCatalog for MockCatalog {
    fn resolve(
        &self,
        _credential: &str,
        allow_list: &[String],
    ) -> BoxFuture<'_, Result<Vec<Arc<dyn Tool>>>> {
        let allow_list = allow_list.to_vec();
        Box::pin(async move {
            if self.fail {
                return Err(WeftError::ToolResolution("catalog unavailable".into()));
            }
            Ok(self
                .tools
                .iter()
                .filter(|t| allow_list.iter().any(|n| n == t.name()))
                .cloned()
                .collect())
        })
    }
}

/// Echoes its `text` argument back.
pub struct EchoTool;

impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "Echo the text argument."
    }
    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": { "text": { "type": "string" } } })
    }
    fn invoke(&self, args: serde_json::Value) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            Ok(args
                .get("text")
                .and_then(|v| v.as_str())
                .unwrap_or("echo")
                .to_string())
        })
    }
}

/// Always errors.
pub struct FailingTool;

impl Tool for FailingTool {
    fn name(&self) -> &str {
        "fail"
    }
    fn description(&self) -> &str {
        "Always fails."
    }
    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object" })
    }
    fn invoke(&self, _args: serde_json::Value) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            Err(WeftError::ToolExecution {
                tool: "fail".into(),
                message: "boom".into(),
            })
        })
    }
}

/// Panics on invocation.
pub struct PanicTool;

impl Tool for PanicTool {
    fn name(&self) -> &str {
        "panic"
    }
    fn description(&self) -> &str {
        "Always panics."
    }
    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object" })
    }
    fn invoke(&self, _args: serde_json::Value) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move { panic!("tool blew up") })
    }
}

/// Never finishes within any sane timeout.
pub struct SlowTool;

impl Tool for SlowTool {
    fn name(&self) -> &str {
        "slow"
    }
    fn description(&self) -> &str {
        "Sleeps for an hour."
    }
    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object" })
    }
    fn invoke(&self, _args: serde_json::Value) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            Ok("late".into())
        })
    }
}

// ── Context builders ────────────────────────────────────────────

pub fn context_with(model: Arc<dyn ChatModel>, catalog: MockCatalog) -> HandlerContext {
    HandlerContext {
        models: Arc::new(FixedFactory { model }),
        catalog: Arc::new(catalog),
        config: EngineConfig::default(),
        cancel: CancellationToken::new(),
    }
}

pub fn context_with_model(model: Arc<dyn ChatModel>) -> HandlerContext {
    context_with(model, MockCatalog::with_tools(Vec::new()))
}

pub fn test_context() -> HandlerContext {
    context_with_model(Arc::new(ScriptedModel::new(Vec::new())))
}

// ── Node and graph builders ─────────────────────────────────────

pub fn input_node(id: &str, query: &str) -> Node {
    Node {
        id: id.into(),
        kind: NodeKind::Input(InputConfig {
            query: query.into(),
        }),
    }
}

pub fn llm_node(id: &str, api_key: Option<&str>) -> Node {
    Node {
        id: id.into(),
        kind: NodeKind::LanguageModel(ModelNodeConfig {
            provider: "openai".into(),
            model: "gpt-4o".into(),
            api_key: api_key.map(String::from),
            instruction: None,
        }),
    }
}

pub fn agent_node(
    id: &str,
    api_key: Option<&str>,
    tool_key: Option<&str>,
    allowed_tools: Option<&str>,
) -> Node {
    Node {
        id: id.into(),
        kind: NodeKind::Agent(AgentNodeConfig {
            provider: "openai".into(),
            model: "gpt-4o".into(),
            api_key: api_key.map(String::from),
            instruction: None,
            tool_key: tool_key.map(String::from),
            allowed_tools: allowed_tools.map(String::from),
        }),
    }
}

pub fn output_node(id: &str) -> Node {
    Node {
        id: id.into(),
        kind: NodeKind::Output,
    }
}

pub fn other_node(id: &str, kind: &str) -> Node {
    Node {
        id: id.into(),
        kind: NodeKind::Other(kind.into()),
    }
}

pub fn graph(nodes: Vec<Node>, edges: Vec<(&str, &str)>) -> Graph {
    Graph {
        nodes,
        edges: edges
            .into_iter()
            .enumerate()
            .map(|(i, (source, target))| Edge {
                id: format!("e{}", i),
                source: source.into(),
                target: target.into(),
            })
            .collect(),
    }
}
