use serde::Deserialize;

use weft_core::error::{Result, WeftError};

/// A workflow graph: ordered nodes plus directed edges, as posted by the
/// builder UI.
#[derive(Debug, Clone, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// A directed link naming which node's output feeds which node's input.
#[derive(Debug, Clone, Deserialize)]
pub struct Edge {
    #[serde(default)]
    pub id: String,
    pub source: String,
    pub target: String,
}

/// A unit of work in the workflow graph.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
}

/// Node kind with its kind-specific configuration.
///
/// An unrecognized kind deserializes to `Other` carrying the raw kind name;
/// the executor routes those to a passthrough handler instead of failing.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Input(InputConfig),
    LanguageModel(ModelNodeConfig),
    Agent(AgentNodeConfig),
    Output,
    Other(String),
}

impl NodeKind {
    /// Stable name used for handler dispatch and trace entries.
    pub fn name(&self) -> &str {
        match self {
            NodeKind::Input(_) => "input",
            NodeKind::LanguageModel(_) => "language_model",
            NodeKind::Agent(_) => "agent",
            NodeKind::Output => "output",
            NodeKind::Other(kind) => kind.as_str(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputConfig {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelNodeConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub instruction: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentNodeConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub instruction: Option<String>,
    /// Credential for the tool backend. Optional: without it the agent runs
    /// tool-less.
    #[serde(default)]
    pub tool_key: Option<String>,
    /// Comma-delimited allow-list of tool identifiers.
    #[serde(default)]
    pub allowed_tools: Option<String>,
}

fn default_provider() -> String {
    "openai".to_string()
}

impl AgentNodeConfig {
    /// Parse the comma-delimited allow-list into trimmed, non-empty names.
    pub fn allow_list(&self) -> Vec<String> {
        self.allowed_tools
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    }
}

// Wire form of a node: { id, kind, config }. The config payload is parsed
// into the matching variant up front so handlers never probe for fields.
#[derive(Deserialize)]
struct RawNode {
    id: String,
    kind: String,
    #[serde(default)]
    config: serde_json::Value,
}

impl TryFrom<RawNode> for Node {
    type Error = String;

    fn try_from(raw: RawNode) -> std::result::Result<Self, Self::Error> {
        let config_err =
            |kind: &str, e: serde_json::Error| format!("node {} ({}): {}", raw.id, kind, e);
        let kind = match raw.kind.as_str() {
            "input" => NodeKind::Input(
                serde_json::from_value(raw.config).map_err(|e| config_err("input", e))?,
            ),
            "language_model" | "llm" => NodeKind::LanguageModel(
                serde_json::from_value(raw.config).map_err(|e| config_err("language_model", e))?,
            ),
            "agent" => NodeKind::Agent(
                serde_json::from_value(raw.config).map_err(|e| config_err("agent", e))?,
            ),
            "output" => NodeKind::Output,
            other => NodeKind::Other(other.to_string()),
        };
        Ok(Node { id: raw.id, kind })
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawNode::deserialize(deserializer)?;
        Node::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl Graph {
    /// Find the unique input node and its trimmed, non-empty query.
    ///
    /// Anything else — no input node, more than one, or a blank query — is a
    /// graph structure error raised before any node runs.
    pub fn find_input_node(&self) -> Result<(&Node, &str)> {
        let mut inputs = self.nodes.iter().filter_map(|n| match &n.kind {
            NodeKind::Input(config) => Some((n, config)),
            _ => None,
        });

        let (node, config) = inputs
            .next()
            .ok_or_else(|| WeftError::GraphStructure("graph must contain an input node".into()))?;
        if inputs.next().is_some() {
            return Err(WeftError::GraphStructure(
                "graph must contain exactly one input node".into(),
            ));
        }

        let query = config.query.trim();
        if query.is_empty() {
            return Err(WeftError::GraphStructure(
                "input node must contain a non-empty query".into(),
            ));
        }
        Ok((node, query))
    }

    /// Target of the first edge leaving `node_id`, or `None` when the graph
    /// terminates here. Multiple outgoing edges are not fanned out; only the
    /// first match is ever followed.
    pub fn next_node(&self, node_id: &str) -> Option<&str> {
        self.edges
            .iter()
            .find(|e| e.source == node_id)
            .map(|e| e.target.as_str())
    }

    /// Look up a node by id.
    pub fn lookup(&self, node_id: &str) -> Result<&Node> {
        self.nodes
            .iter()
            .find(|n| n.id == node_id)
            .ok_or_else(|| WeftError::NodeNotFound(node_id.to_string()))
    }
}
