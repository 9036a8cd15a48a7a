//! Text-generation backend abstractions
//!
//! This module provides the provider interface for chat-completion backends,
//! the OpenAI implementation, and the interview answer generator built on it.

pub mod errors;
pub mod generator;
pub mod openai;
pub mod provider;
pub mod types;

pub use errors::*;
pub use generator::AnswerGenerator;
pub use openai::OpenAIProvider;
pub use types::*;
