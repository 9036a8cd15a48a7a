//! Provider trait for chat-completion backends

use async_trait::async_trait;

use crate::llm::{
    errors::LlmResult,
    types::{ChatRequest, ProviderResponse},
};

/// Trait for chat-completion providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request and get a response
    async fn chat_completion(&self, request: ChatRequest) -> LlmResult<ProviderResponse>;

    /// Get the provider name
    fn name(&self) -> &str;

    /// Get the model name
    fn model(&self) -> &str;
}

/// Provider client options
#[derive(Debug, Clone)]
pub struct ProviderClientOptions {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for ProviderClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 300,
            user_agent: concat!("interview-assistant/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Utility functions for provider implementations
pub mod utils {
    /// Extract error message from HTTP response
    pub async fn extract_error_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.text().await {
            Ok(text) => {
                if let Ok(json) = serde_json::from_str::<serde_json::Value>(&text) {
                    if let Some(message) = json.get("error").and_then(|e| e.get("message")) {
                        return format!("{}: {}", status, message.as_str().unwrap_or("Unknown error"));
                    }
                }
                format!("{}: {}", status, text)
            }
            Err(_) => format!("{}: Failed to read error response", status),
        }
    }
}
