//! Interview answer generation on top of an [`LlmProvider`]

use std::sync::Arc;
use tracing::{debug, error, info};

use crate::llm::{
    errors::{LlmError, LlmResult},
    provider::LlmProvider,
    types::{ChatRequest, Message},
};

const ANSWER_SYSTEM_PROMPT: &str = "You are an intelligent interview assistant. Your role is to help candidates answer interview questions effectively.

When given a question, provide:
1. A clear, concise answer that demonstrates competence
2. Relevant examples or experiences when appropriate
3. Professional tone suitable for an interview setting

Keep responses focused and interview-appropriate. Aim for answers that are 1-3 minutes when spoken aloud.";

const FOLLOW_UP_SYSTEM_PROMPT: &str =
    "Generate 3 relevant follow-up interview questions for the given topic. Return as a simple list.";

const IMPROVE_SYSTEM_PROMPT: &str = "You are helping improve interview answers. Make the answer more compelling, specific, and interview-appropriate while maintaining authenticity.";

const ANSWER_MAX_TOKENS: u32 = 500;
const FOLLOW_UP_MAX_TOKENS: u32 = 200;
const FOLLOW_UP_TEMPERATURE: f32 = 0.8;
const IMPROVE_MAX_TOKENS: u32 = 500;
const IMPROVE_TEMPERATURE: f32 = 0.6;
const MAX_FOLLOW_UPS: usize = 3;

/// Produces interview answers, follow-up questions and answer rewrites.
#[derive(Clone)]
pub struct AnswerGenerator {
    provider: Arc<dyn LlmProvider>,
    temperature: f32,
}

impl AnswerGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, temperature: f32) -> Self {
        Self {
            provider,
            temperature,
        }
    }

    /// Generate an answer for an interview question.
    pub async fn generate_answer(&self, question: &str) -> LlmResult<String> {
        let answer = self
            .complete(
                ANSWER_SYSTEM_PROMPT,
                format!("Interview question: {}", question),
                ANSWER_MAX_TOKENS,
                self.temperature,
            )
            .await
            .map_err(|e| {
                error!("Error generating answer with {}: {}", self.provider.name(), e);
                e
            })?;

        info!("Generated answer for question: {}...", preview(question));
        Ok(answer)
    }

    /// Suggest up to three follow-up questions. Best effort: failures yield an empty list.
    pub async fn generate_follow_up_questions(&self, topic: &str) -> Vec<String> {
        match self
            .complete(
                FOLLOW_UP_SYSTEM_PROMPT,
                format!("Topic: {}", topic),
                FOLLOW_UP_MAX_TOKENS,
                FOLLOW_UP_TEMPERATURE,
            )
            .await
        {
            Ok(text) => parse_follow_ups(&text),
            Err(e) => {
                error!("Error generating follow-up questions: {}", e);
                Vec::new()
            }
        }
    }

    /// Rewrite an existing answer to be more compelling.
    pub async fn improve_answer(&self, question: &str, current_answer: &str) -> LlmResult<String> {
        self.complete(
            IMPROVE_SYSTEM_PROMPT,
            format!(
                "Question: {}\n\nCurrent answer: {}\n\nProvide an improved version:",
                question, current_answer
            ),
            IMPROVE_MAX_TOKENS,
            IMPROVE_TEMPERATURE,
        )
        .await
        .map_err(|e| {
            error!("Error improving answer: {}", e);
            e
        })
    }

    async fn complete(
        &self,
        instruction: &str,
        user_content: String,
        max_tokens: u32,
        temperature: f32,
    ) -> LlmResult<String> {
        let response = self
            .provider
            .chat_completion(ChatRequest {
                messages: vec![Message::new_system(instruction), Message::new_user(user_content)],
                max_tokens: Some(max_tokens),
                temperature: Some(temperature),
            })
            .await?;

        debug!(
            provider = self.provider.name(),
            model = self.provider.model(),
            prompt_tokens = response.usage.input_tokens,
            completion_tokens = response.usage.output_tokens,
            total_tokens = response.usage.total_tokens,
            finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
            "completion received"
        );

        let text = response.content.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyCompletion);
        }
        Ok(text.to_string())
    }
}

fn parse_follow_ups(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(MAX_FOLLOW_UPS)
        .map(str::to_string)
        .collect()
}

fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}
