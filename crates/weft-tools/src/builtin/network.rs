use std::time::Duration;

use futures::future::BoxFuture;
use serde::Deserialize;

use weft_core::error::{Result, WeftError};
use weft_core::traits::Tool;

// ── HttpRequestTool ─────────────────────────────────────────────

pub struct HttpRequestTool;

#[derive(Deserialize)]
struct HttpRequestInput {
    url: String,
    #[serde(default = "default_method")]
    method: String,
    #[serde(default)]
    headers: std::collections::HashMap<String, String>,
    #[serde(default)]
    body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

impl Tool for HttpRequestTool {
    fn name(&self) -> &str {
        "http_request"
    }
    fn timeout_secs(&self) -> u64 {
        60
    }
    fn description(&self) -> &str {
        "Make an HTTP request. Returns status and body."
    }
    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": { "type": "string" },
                "method": { "type": "string", "description": "HTTP method (default: GET)" },
                "headers": { "type": "object", "description": "Request headers" },
                "body": { "type": "string", "description": "Request body" }
            },
            "required": ["url"]
        })
    }
    fn invoke(&self, input: serde_json::Value) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            let p: HttpRequestInput = serde_json::from_value(input).map_err(|e| {
                WeftError::ToolExecution {
                    tool: "http_request".into(),
                    message: e.to_string(),
                }
            })?;
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .map_err(|e| WeftError::ToolExecution {
                    tool: "http_request".into(),
                    message: e.to_string(),
                })?;

            let method = p
                .method
                .to_uppercase()
                .parse::<reqwest::Method>()
                .map_err(|e| WeftError::ToolExecution {
                    tool: "http_request".into(),
                    message: format!("Invalid method: {}", e),
                })?;

            let mut req = client.request(method, &p.url);
            for (k, v) in &p.headers {
                req = req.header(k.as_str(), v.as_str());
            }
            if let Some(body) = p.body {
                req = req.body(body);
            }

            let response = req.send().await.map_err(|e| WeftError::ToolExecution {
                tool: "http_request".into(),
                message: e.to_string(),
            })?;

            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Ok(format!("HTTP {}\n\n{}", status, body))
        })
    }
}
