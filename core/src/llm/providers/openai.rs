//! OpenAI client implementation using async-openai library

use crate::config::ResolvedLlmConfig;
use crate::error::{LlmError, Result};
use crate::llm::{
    ChatOptions, FinishReason, LlmClient, LlmMessage, LlmResponse, MessageRole, Usage,
};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;

/// OpenAI-compatible client using async-openai library
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiClient {
    /// Create a new OpenAI client from resolved LLM config
    pub fn new(config: &ResolvedLlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::Authentication {
                message: "No API key found for OpenAI".to_string(),
            }
            .into());
        }

        if !config.headers.is_empty() {
            tracing::debug!(
                "Ignoring {} custom headers for the OpenAI-compatible client",
                config.headers.len()
            );
        }

        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(config.base_url.trim_end_matches('/'));

        Ok(Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
        })
    }

    /// Convert our internal message format to async-openai format
    fn convert_messages(&self, messages: Vec<LlmMessage>) -> Vec<ChatCompletionRequestMessage> {
        messages
            .into_iter()
            .map(|message| match message.role {
                MessageRole::System => {
                    ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                        content: message.content.into(),
                        name: None,
                    })
                }
                MessageRole::User => {
                    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                        content: message.content.into(),
                        name: None,
                    })
                }
                MessageRole::Assistant => {
                    ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                        content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                            message.content,
                        )),
                        ..Default::default()
                    })
                }
            })
            .collect()
    }

    /// Convert async-openai response to our internal format
    fn convert_response(
        &self,
        response: async_openai::types::CreateChatCompletionResponse,
    ) -> Result<LlmResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?;

        let usage = response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        let finish_reason = choice.finish_reason.map(|reason| match reason {
            async_openai::types::FinishReason::Stop => FinishReason::Stop,
            async_openai::types::FinishReason::Length => FinishReason::Length,
            async_openai::types::FinishReason::ContentFilter => FinishReason::ContentFilter,
            other => FinishReason::Other(format!("{:?}", other)),
        });

        Ok(LlmResponse {
            message: LlmMessage::assistant(choice.message.content.unwrap_or_default()),
            usage,
            model: response.model,
            finish_reason,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder.model(&self.model);
        request_builder.messages(self.convert_messages(messages));

        if let Some(opts) = options {
            if let Some(max_tokens) = opts.max_tokens {
                request_builder.max_tokens(max_tokens);
            }
            if let Some(temperature) = opts.temperature {
                request_builder.temperature(temperature);
            }
            if let Some(top_p) = opts.top_p {
                request_builder.top_p(top_p);
            }
        }

        let request = request_builder.build().map_err(|e| {
            tracing::error!("Failed to build OpenAI request: {}", e);
            LlmError::InvalidRequest {
                message: format!("Failed to build request: {}", e),
            }
        })?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            tracing::error!("OpenAI API call failed: {}", e);
            match e {
                async_openai::error::OpenAIError::Reqwest(err) => LlmError::Network {
                    message: err.to_string(),
                },
                other => LlmError::ApiError {
                    // async-openai doesn't expose status codes directly
                    status: 500,
                    message: other.to_string(),
                },
            }
        })?;

        self.convert_response(response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Protocol;

    #[test]
    fn test_convert_messages_preserves_roles() {
        let config = ResolvedLlmConfig::new(
            Protocol::OpenAICompat,
            "https://api.openai.com/v1".to_string(),
            "sk-test".to_string(),
            "gpt-4o".to_string(),
        );
        let client = OpenAiClient::new(&config).unwrap();
        let converted = client.convert_messages(vec![
            LlmMessage::system("rules"),
            LlmMessage::user("q"),
            LlmMessage::assistant("Thought1: x"),
        ]);

        assert_eq!(converted.len(), 3);
        assert!(matches!(converted[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(converted[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(converted[2], ChatCompletionRequestMessage::Assistant(_)));
    }
}
