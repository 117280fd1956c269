//! LLM provider implementations

pub mod anthropic;
pub mod google;
pub mod openai;

pub use anthropic::AnthropicClient;
pub use google::GoogleClient;
pub use openai::OpenAiClient;

use crate::config::{Protocol, ResolvedLlmConfig};
use crate::error::{LlmError, Result};
use crate::llm::LlmClient;
use std::sync::Arc;

/// Create the client for the configured protocol
pub fn create_client(config: &ResolvedLlmConfig) -> Result<Arc<dyn LlmClient>> {
    let client: Arc<dyn LlmClient> = match config.protocol {
        Protocol::GoogleAI => Arc::new(GoogleClient::new(config)?),
        Protocol::OpenAICompat => Arc::new(OpenAiClient::new(config)?),
        Protocol::Anthropic => Arc::new(AnthropicClient::new(config)?),
    };
    Ok(client)
}

/// Map a non-success HTTP status and body onto an LLM error
pub(crate) fn status_error(status: u16, body: String) -> LlmError {
    match status {
        401 | 403 => LlmError::Authentication { message: body },
        429 => LlmError::RateLimit,
        _ => LlmError::ApiError {
            status,
            message: body,
        },
    }
}

pub(crate) fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()
        .map_err(|e| {
            LlmError::Network {
                message: format!("Failed to build HTTP client: {}", e),
            }
            .into()
        })
}
