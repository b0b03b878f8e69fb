pub mod providers;

use std::sync::Arc;

use weft_core::traits::{ChatModel, ModelFactory};

pub use providers::anthropic::AnthropicClient;
pub use providers::gemini::GeminiClient;
pub use providers::openai::OpenAiClient;

/// Create a chat client based on the provider name.
pub fn create_client(provider: &str) -> Arc<dyn ChatModel> {
    match provider {
        "anthropic" | "claude" => Arc::new(AnthropicClient::new()),
        "google" | "gemini" => Arc::new(GeminiClient::new()),
        // Everything else uses the OpenAI-compatible client
        _ => Arc::new(OpenAiClient::new()),
    }
}

/// `ModelFactory` backed by the real provider clients.
#[derive(Default)]
pub struct ProviderFactory;

impl ModelFactory for ProviderFactory {
    fn create(&self, provider: &str) -> Arc<dyn ChatModel> {
        create_client(provider)
    }
}
