use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use weft_core::config::ModelConfig;
use weft_core::error::{Result, WeftError};
use weft_core::traits::ChatModel;
use weft_core::types::*;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    http: Client,
}

impl AnthropicClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }
}

impl Default for AnthropicClient {
    fn default() -> Self {
        Self::new()
    }
}

// Anthropic API request types
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
}

#[derive(Serialize)]
struct ApiMessage {
    role: String,
    content: serde_json::Value,
}

#[derive(Serialize)]
struct ApiTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

// Anthropic API response types
#[derive(Deserialize, Debug)]
struct AnthropicResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type")]
enum ResponseBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize, Debug)]
struct ApiErrorDetail {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: String,
}

/// Split the system prompt out and convert the rest to Anthropic's
/// content-block wire format.
fn convert_messages(messages: Vec<ChatMessage>) -> (Option<String>, Vec<ApiMessage>) {
    let mut system = None;
    let mut api_msgs = Vec::new();

    for msg in messages {
        match msg.role {
            Role::System => {
                system = Some(msg.text());
            }
            Role::User => {
                let mut blocks = Vec::new();
                for block in &msg.content {
                    match block {
                        ContentBlock::Text { text } => {
                            blocks.push(json!({ "type": "text", "text": text }));
                        }
                        ContentBlock::ToolResult {
                            tool_call_id,
                            content,
                            is_error,
                        } => {
                            blocks.push(json!({
                                "type": "tool_result",
                                "tool_use_id": tool_call_id,
                                "content": content,
                                "is_error": is_error,
                            }));
                        }
                        ContentBlock::ToolUse { .. } => {}
                    }
                }
                api_msgs.push(ApiMessage {
                    role: "user".to_string(),
                    content: serde_json::Value::Array(blocks),
                });
            }
            Role::Assistant => {
                let mut blocks = Vec::new();
                for block in &msg.content {
                    match block {
                        ContentBlock::Text { text } => {
                            blocks.push(json!({ "type": "text", "text": text }));
                        }
                        ContentBlock::ToolUse {
                            id,
                            name,
                            arguments,
                        } => {
                            let input: serde_json::Value = serde_json::from_str(arguments)
                                .unwrap_or(serde_json::Value::Null);
                            blocks.push(json!({
                                "type": "tool_use",
                                "id": id,
                                "name": name,
                                "input": input,
                            }));
                        }
                        ContentBlock::ToolResult { .. } => {}
                    }
                }
                api_msgs.push(ApiMessage {
                    role: "assistant".to_string(),
                    content: serde_json::Value::Array(blocks),
                });
            }
        }
    }

    (system, api_msgs)
}

impl ChatModel for AnthropicClient {
    fn invoke(
        &self,
        config: &ModelConfig,
        messages: Vec<ChatMessage>,
        tools: &[ToolDefinition],
    ) -> BoxFuture<'_, Result<ChatResponse>> {
        let url = config
            .base_url
            .clone()
            .unwrap_or_else(|| ANTHROPIC_API_URL.to_string());
        let api_key = config.api_key.clone().unwrap_or_default();

        let (system, api_msgs) = convert_messages(messages);
        let request = AnthropicRequest {
            model: config.model_id.clone(),
            max_tokens: config.max_tokens,
            temperature: Some(config.temperature),
            messages: api_msgs,
            system,
            tools: tools
                .iter()
                .map(|t| ApiTool {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    input_schema: t.input_schema.clone(),
                })
                .collect(),
        };

        Box::pin(async move {
            let response = self
                .http
                .post(&url)
                .header("x-api-key", &api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&request)
                .send()
                .await
                .map_err(|e| WeftError::LlmRequest(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let detail: Option<ApiErrorBody> = serde_json::from_str(&body).ok();
                let is_auth = status == reqwest::StatusCode::UNAUTHORIZED
                    || status == reqwest::StatusCode::FORBIDDEN
                    || detail
                        .as_ref()
                        .is_some_and(|d| d.error.kind == "authentication_error");
                let message = detail
                    .map(|d| d.error.message)
                    .unwrap_or_else(|| format!("{}: {}", status, body));
                if is_auth {
                    return Err(WeftError::Authentication(message));
                }
                return Err(WeftError::LlmRequest(message));
            }

            let parsed: AnthropicResponse = response
                .json()
                .await
                .map_err(|e| WeftError::LlmParse(e.to_string()))?;

            let mut content = String::new();
            let mut tool_calls = Vec::new();
            for block in parsed.content {
                match block {
                    ResponseBlock::Text { text } => content.push_str(&text),
                    ResponseBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall {
                        id,
                        name,
                        arguments: input.to_string(),
                    }),
                    ResponseBlock::Other => {}
                }
            }

            debug!(tool_calls = tool_calls.len(), "Anthropic response received");

            Ok(ChatResponse {
                content,
                tool_calls,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_message_extracted() {
        let (system, msgs) =
            convert_messages(vec![ChatMessage::system("be brief"), ChatMessage::user("hi")]);
        assert_eq!(system.as_deref(), Some("be brief"));
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].role, "user");
    }

    #[test]
    fn test_tool_use_arguments_parsed_to_input() {
        let response = ChatResponse {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: "c1".into(),
                name: "search".into(),
                arguments: r#"{"q":"rust"}"#.into(),
            }],
        };
        let (_, msgs) = convert_messages(vec![response.into_message()]);
        let blocks = msgs[0].content.as_array().unwrap();
        assert_eq!(blocks[0]["type"], "tool_use");
        assert_eq!(blocks[0]["input"]["q"], "rust");
    }
}
