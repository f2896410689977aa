//! Chat-completions client and configuration.

mod chat;
mod llm_client;
mod llm_config;

pub use chat::{ChatChoice, ChatMessage, ChatRequest, ChatResponse, ChatUsage, ChoiceMessage};
pub use llm_client::{CompletionProvider, LlmClient};
pub use llm_config::{LlmConfig, LlmConfigBuilder, LlmConfigBuilderError};
