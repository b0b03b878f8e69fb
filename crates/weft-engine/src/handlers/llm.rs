use futures::future::BoxFuture;
use tracing::{debug, info};

use weft_core::error::{Result, WeftError};
use weft_core::types::ChatMessage;

use crate::graph::{Node, NodeKind};
use crate::state::{preview, ExecutionState};

use super::{build_system_prompt, model_config, require_api_key, HandlerContext, NodeHandler};

/// Single model call: system framing + the current value as the human turn.
pub struct LanguageModelHandler;

impl NodeHandler for LanguageModelHandler {
    fn execute<'a>(
        &'a self,
        node: &'a Node,
        mut state: ExecutionState,
        cx: &'a HandlerContext,
    ) -> BoxFuture<'a, Result<ExecutionState>> {
        Box::pin(async move {
            let NodeKind::LanguageModel(config) = &node.kind else {
                return Err(WeftError::Configuration(format!(
                    "language_model handler dispatched to node {} of kind {}",
                    node.id,
                    node.kind.name()
                )));
            };

            let api_key = require_api_key(&node.id, config.api_key.as_deref())?;
            let current = state.current_text();
            let system = build_system_prompt(
                &state.original_query,
                &current,
                config.instruction.as_deref(),
            );
            let messages = vec![ChatMessage::system(system), ChatMessage::user(&current)];

            info!(node_id = %node.id, provider = %config.provider, model = %config.model, "Invoking model node");

            let model = cx.models.create(&config.provider);
            let model_cfg = model_config(&config.provider, &config.model, api_key);
            let response = tokio::select! {
                result = model.invoke(&model_cfg, messages, &[]) => result?,
                _ = cx.cancel.cancelled() => return Err(WeftError::Cancelled),
            };

            debug!(node_id = %node.id, chars = response.content.len(), "Model node response");
            state.trace.push(format!(
                "Result (LLM {}): {}",
                node.id,
                preview(&response.content)
            ));
            state.current_value = serde_json::Value::String(response.content);
            Ok(state)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use weft_core::types::ChatResponse;

    use crate::testing::{context_with_model, llm_node, test_context, ScriptedModel};

    #[tokio::test]
    async fn test_missing_api_key_is_configuration_error() {
        let cx = test_context();
        let node = llm_node("m", None);
        let err = LanguageModelHandler
            .execute(&node, ExecutionState::new("q"), &cx)
            .await
            .unwrap_err();
        assert!(matches!(err, WeftError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_response_becomes_current_value() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(ChatResponse::text("answer"))]));
        let cx = context_with_model(model.clone());
        let node = llm_node("m", Some("sk-test"));

        let state = LanguageModelHandler
            .execute(&node, ExecutionState::new("q"), &cx)
            .await
            .unwrap();
        assert_eq!(state.current_text(), "answer");
        assert_eq!(model.calls(), 1);
        assert!(state.trace.entries()[0].starts_with("Result (LLM m):"));
    }

    #[tokio::test]
    async fn test_auth_error_propagates() {
        let model = Arc::new(ScriptedModel::new(vec![Err(WeftError::Authentication(
            "bad key".into(),
        ))]));
        let cx = context_with_model(model);
        let node = llm_node("m", Some("sk-bad"));

        let err = LanguageModelHandler
            .execute(&node, ExecutionState::new("q"), &cx)
            .await
            .unwrap_err();
        assert!(matches!(err, WeftError::Authentication(_)));
    }
}
