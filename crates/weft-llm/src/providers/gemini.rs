use std::collections::HashMap;

use futures::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use weft_core::config::ModelConfig;
use weft_core::error::{Result, WeftError};
use weft_core::traits::ChatModel;
use weft_core::types::*;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiClient {
    http: Client,
}

impl GeminiClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize, Debug)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(rename = "functionCall", default)]
    function_call: Option<FunctionCall>,
}

#[derive(Deserialize, Debug)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

/// Convert history to Gemini's contents array.
///
/// Gemini correlates tool responses by function name, not call id, so the
/// conversion tracks which synthesized id maps to which name.
fn convert_messages(messages: &[ChatMessage]) -> (Option<serde_json::Value>, Vec<serde_json::Value>) {
    let mut system = None;
    let mut contents = Vec::new();
    let mut call_names: HashMap<String, String> = HashMap::new();

    for msg in messages {
        match msg.role {
            Role::System => {
                system = Some(json!({ "parts": [{ "text": msg.text() }] }));
            }
            Role::User => {
                let mut parts = Vec::new();
                for block in &msg.content {
                    match block {
                        ContentBlock::Text { text } => parts.push(json!({ "text": text })),
                        ContentBlock::ToolResult {
                            tool_call_id,
                            content,
                            is_error,
                        } => {
                            let name = call_names
                                .get(tool_call_id)
                                .cloned()
                                .unwrap_or_else(|| tool_call_id.clone());
                            let key = if *is_error { "error" } else { "result" };
                            parts.push(json!({
                                "functionResponse": {
                                    "name": name,
                                    "response": { key: content },
                                }
                            }));
                        }
                        ContentBlock::ToolUse { .. } => {}
                    }
                }
                contents.push(json!({ "role": "user", "parts": parts }));
            }
            Role::Assistant => {
                let mut parts = Vec::new();
                for block in &msg.content {
                    match block {
                        ContentBlock::Text { text } => parts.push(json!({ "text": text })),
                        ContentBlock::ToolUse {
                            id,
                            name,
                            arguments,
                        } => {
                            call_names.insert(id.clone(), name.clone());
                            let args: serde_json::Value = serde_json::from_str(arguments)
                                .unwrap_or_else(|_| json!({}));
                            parts.push(json!({
                                "functionCall": { "name": name, "args": args }
                            }));
                        }
                        ContentBlock::ToolResult { .. } => {}
                    }
                }
                contents.push(json!({ "role": "model", "parts": parts }));
            }
        }
    }

    (system, contents)
}

impl ChatModel for GeminiClient {
    fn invoke(
        &self,
        config: &ModelConfig,
        messages: Vec<ChatMessage>,
        tools: &[ToolDefinition],
    ) -> BoxFuture<'_, Result<ChatResponse>> {
        let base = config
            .base_url
            .clone()
            .unwrap_or_else(|| GEMINI_API_BASE.to_string());
        let api_key = config.api_key.clone().unwrap_or_default();
        let url = format!("{}/{}:generateContent?key={}", base, config.model_id, api_key);

        let (system, contents) = convert_messages(&messages);
        let mut request = json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": config.max_tokens,
                "temperature": config.temperature,
            },
        });
        if let Some(system) = system {
            request["systemInstruction"] = system;
        }
        if !tools.is_empty() {
            let declarations: Vec<_> = tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.input_schema,
                    })
                })
                .collect();
            request["tools"] = json!([{ "functionDeclarations": declarations }]);
        }

        Box::pin(async move {
            let response = self
                .http
                .post(&url)
                .json(&request)
                .send()
                .await
                .map_err(|e| WeftError::LlmRequest(e.to_string()))?;

            let status = response.status();
            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                let body = response.text().await.unwrap_or_default();
                return Err(WeftError::Authentication(body));
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                // Gemini reports a bad key as a 400 INVALID_ARGUMENT
                if body.contains("API_KEY_INVALID") || body.contains("API key not valid") {
                    return Err(WeftError::Authentication(body));
                }
                return Err(WeftError::LlmRequest(format!("{}: {}", status, body)));
            }

            let parsed: GeminiResponse = response
                .json()
                .await
                .map_err(|e| WeftError::LlmParse(e.to_string()))?;

            let candidate = parsed
                .candidates
                .into_iter()
                .next()
                .ok_or_else(|| WeftError::LlmParse("response contained no candidates".into()))?;

            let mut content = String::new();
            let mut tool_calls = Vec::new();
            for part in candidate.content.parts {
                if let Some(text) = part.text {
                    content.push_str(&text);
                }
                if let Some(call) = part.function_call {
                    // Gemini does not issue call ids; synthesize one so the
                    // engine's correlation invariant still holds.
                    tool_calls.push(ToolCall {
                        id: Uuid::new_v4().to_string(),
                        name: call.name,
                        arguments: call.args.to_string(),
                    });
                }
            }

            debug!(tool_calls = tool_calls.len(), "Gemini response received");

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
    fn test_function_response_correlated_by_name() {
        let response = ChatResponse {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: "call-1".into(),
                name: "search".into(),
                arguments: r#"{"q":"x"}"#.into(),
            }],
        };
        let messages = vec![
            ChatMessage::user("hi"),
            response.into_message(),
            ChatMessage::tool_result("call-1", "found it", false),
        ];
        let (_, contents) = convert_messages(&messages);
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(
            contents[2]["parts"][0]["functionResponse"]["name"],
            "search"
        );
    }

    #[test]
    fn test_system_instruction_split_out() {
        let (system, contents) =
            convert_messages(&[ChatMessage::system("sys"), ChatMessage::user("hi")]);
        assert!(system.is_some());
        assert_eq!(contents.len(), 1);
    }
}
