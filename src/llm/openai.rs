//! OpenAI chat-completions provider

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::llm::{
    errors::{LlmError, LlmResult},
    provider::{utils, LlmProvider, ProviderClientOptions},
    types::{ChatRequest, Message, MessageRole, ProviderConfig, ProviderResponse, TokenUsage},
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// OpenAI API provider
#[derive(Debug, Clone)]
pub struct OpenAIProvider {
    client: Client,
    config: ProviderConfig,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider. The API key is mandatory.
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let mut headers = HeaderMap::new();

        match config.api_key.as_deref().filter(|key| !key.trim().is_empty()) {
            Some(api_key) => {
                let auth_value = HeaderValue::from_str(&format!("Bearer {}", api_key))
                    .map_err(|e| LlmError::ConfigError(format!("Invalid API key: {}", e)))?;
                headers.insert(AUTHORIZATION, auth_value);
            }
            None => return Err(LlmError::ConfigError("API key is required".to_string())),
        }

        if config.model.trim().is_empty() {
            return Err(LlmError::ConfigError("Model is required".to_string()));
        }

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let options = ProviderClientOptions::default();
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(options.timeout_seconds))
            .user_agent(&options.user_agent)
            .build()
            .map_err(|e| LlmError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn convert_messages(messages: &[Message]) -> Vec<OpenAIMessage> {
        messages
            .iter()
            .map(|msg| OpenAIMessage {
                role: match msg.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                },
                content: msg.content.clone(),
            })
            .collect()
    }

    fn get_endpoint(&self) -> String {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        format!("{}/v1/chat/completions", base_url)
    }

    fn build_body(&self, request: &ChatRequest) -> serde_json::Value {
        let mut body = json!({
            "model": self.config.model,
            "messages": Self::convert_messages(&request.messages),
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }

        body
    }

    /// One round trip; failures are reported, never retried.
    async fn execute_request(&self, body: serde_json::Value) -> LlmResult<OpenAIResponse> {
        let response = self.client.post(self.get_endpoint()).json(&body).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<OpenAIResponse>().await?);
        }

        let error_msg = utils::extract_error_message(response).await;
        Err(match status.as_u16() {
            429 => LlmError::RateLimitError(error_msg),
            401 | 403 => LlmError::AuthError(error_msg),
            _ => LlmError::ApiError(error_msg),
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    async fn chat_completion(&self, request: ChatRequest) -> LlmResult<ProviderResponse> {
        debug!(model = %self.config.model, messages = request.messages.len(), "chat completion request");

        let response = self.execute_request(self.build_body(&request)).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyCompletion)?;

        let usage = response.usage.unwrap_or_default();

        Ok(ProviderResponse {
            content: choice.message.content.unwrap_or_default(),
            usage: TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            },
            finish_reason: choice.finish_reason,
        })
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
