use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::debug;

use weft_core::error::{Result, WeftError};
use weft_core::traits::{Tool, ToolCatalog};
use weft_core::types::ToolDefinition;

/// Registry of available tools.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool.
    pub fn register(&mut self, tool: impl Tool) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all registered tool names.
    pub fn list(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Get tool definitions for sending to the LLM.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Create a registry with all built-in tools registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(crate::builtin::network::HttpRequestTool);
        registry.register(crate::builtin::data::JsonQueryTool);
        registry.register(crate::builtin::time::CurrentTimeTool);
        registry
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A `ToolCatalog` over a fixed registry.
///
/// Stands in for a remote tool backend: resolution takes a credential and an
/// allow-list and hands back concrete tools. A name in the allow-list that is
/// not registered fails the whole resolution, which callers treat as a
/// degraded "no tools" condition rather than a fatal error.
pub struct StaticCatalog {
    registry: ToolRegistry,
}

impl StaticCatalog {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn with_builtins() -> Self {
        Self::new(ToolRegistry::with_builtins())
    }
}

impl ToolCatalog for StaticCatalog {
    fn resolve(
        &self,
        _credential: &str,
        allow_list: &[String],
    ) -> BoxFuture<'_, Result<Vec<Arc<dyn Tool>>>> {
        let allow_list = allow_list.to_vec();
        Box::pin(async move {
            let mut resolved = Vec::with_capacity(allow_list.len());
            for name in &allow_list {
                let tool = self.registry.get(name).ok_or_else(|| {
                    WeftError::ToolResolution(format!("unknown tool in allow-list: {}", name))
                })?;
                resolved.push(tool);
            }
            debug!(count = resolved.len(), "Resolved tool allow-list");
            Ok(resolved)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_allow_list() {
        let catalog = StaticCatalog::with_builtins();
        let tools = catalog
            .resolve("key", &["current_time".into(), "json_query".into()])
            .await
            .unwrap();
        assert_eq!(tools.len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_unknown_tool_fails() {
        let catalog = StaticCatalog::with_builtins();
        let result = catalog.resolve("key", &["no_such_tool".into()]).await;
        assert!(matches!(result, Err(WeftError::ToolResolution(_))));
    }

    #[test]
    fn test_definitions_cover_all_registered() {
        let registry = ToolRegistry::with_builtins();
        let defs = registry.definitions();
        assert_eq!(defs.len(), registry.list().len());
        assert!(defs.iter().any(|d| d.name == "http_request"));
    }
}
