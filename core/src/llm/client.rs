//! LLM client trait and response structures

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::message::LlmMessage;

/// Trait for LLM clients.
///
/// This is the completion capability the reasoning loop depends on: a
/// conversation goes in, text comes out. Any error returned here aborts the
/// run.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a chat completion request
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse>;

    /// Get the model name
    fn model_name(&self) -> &str;

    /// Get the provider name
    fn provider_name(&self) -> &str;
}

/// Response from an LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated message
    pub message: LlmMessage,

    /// Usage statistics
    pub usage: Option<Usage>,

    /// Model used for generation
    pub model: String,

    /// Finish reason
    pub finish_reason: Option<FinishReason>,
}

/// Usage statistics for a request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    /// Number of tokens in the prompt
    pub prompt_tokens: u32,

    /// Number of tokens in the completion
    pub completion_tokens: u32,

    /// Total number of tokens
    pub total_tokens: u32,
}

/// Reason why generation finished
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Generation completed naturally
    Stop,

    /// Hit the maximum token limit
    Length,

    /// Content was filtered
    ContentFilter,

    /// Other reason
    Other(String),
}

/// Options for chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatOptions {
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,

    /// Temperature for generation
    pub temperature: Option<f32>,

    /// Top-p sampling parameter
    pub top_p: Option<f32>,

    /// Stop sequences
    pub stop: Option<Vec<String>>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            max_tokens: Some(8192),
            temperature: Some(0.7),
            top_p: Some(1.0),
            stop: None,
        }
    }
}

impl ChatOptions {
    /// Build request options from configured model parameters, keeping the
    /// defaults for anything left unset
    pub fn from_params(params: &crate::config::ModelParams) -> Self {
        let defaults = Self::default();
        Self {
            max_tokens: params.max_tokens.or(defaults.max_tokens),
            temperature: params.temperature.or(defaults.temperature),
            top_p: params.top_p.or(defaults.top_p),
            stop: params.stop_sequences.clone(),
        }
    }
}
