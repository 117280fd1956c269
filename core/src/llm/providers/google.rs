//! Google Gemini client implementation

use crate::config::ResolvedLlmConfig;
use crate::error::{LlmError, Result};
use crate::llm::message::split_system;
use crate::llm::{
    ChatOptions, FinishReason, LlmClient, LlmMessage, LlmResponse, MessageRole, Usage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Gemini client speaking the `generateContent` REST API
pub struct GoogleClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    headers: HashMap<String, String>,
}

impl GoogleClient {
    /// Create a new Gemini client from resolved LLM config
    pub fn new(config: &ResolvedLlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::Authentication {
                message: "No API key found for Google AI".to_string(),
            }
            .into());
        }

        Ok(Self {
            client: super::build_http_client()?,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            headers: config.headers.clone(),
        })
    }

    fn build_request(&self, messages: Vec<LlmMessage>, options: ChatOptions) -> GeminiRequest {
        let (system, conversation) = split_system(messages);

        let contents = conversation
            .into_iter()
            .map(|message| GeminiContent {
                role: Some(match message.role {
                    MessageRole::Assistant => "model".to_string(),
                    _ => "user".to_string(),
                }),
                parts: vec![GeminiPart {
                    text: Some(message.content),
                }],
            })
            .collect();

        GeminiRequest {
            contents,
            system_instruction: system.map(|text| GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: Some(text) }],
            }),
            generation_config: Some(GenerationConfig {
                max_output_tokens: options.max_tokens,
                temperature: options.temperature,
                top_p: options.top_p,
                stop_sequences: options.stop,
            }),
        }
    }

    fn convert_response(&self, response: GeminiResponse) -> Result<LlmResponse> {
        let candidate = response
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?;

        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let finish_reason = candidate.finish_reason.map(|reason| match reason.as_str() {
            "STOP" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::Length,
            "SAFETY" | "RECITATION" | "BLOCKLIST" => FinishReason::ContentFilter,
            _ => FinishReason::Other(reason),
        });

        let usage = response.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count.unwrap_or(0),
            completion_tokens: u.candidates_token_count.unwrap_or(0),
            total_tokens: u.total_token_count.unwrap_or(0),
        });

        Ok(LlmResponse {
            message: LlmMessage::assistant(text),
            usage,
            model: response.model_version.unwrap_or_else(|| self.model.clone()),
            finish_reason,
        })
    }
}

#[async_trait]
impl LlmClient for GoogleClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let request = self.build_request(messages, options.unwrap_or_default());
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let mut builder = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json");
        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }

        let response = builder
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Gemini API returned {}: {}", status, error_text);
            return Err(super::status_error(status, error_text).into());
        }

        let gemini_response: GeminiResponse =
            response.json().await.map_err(|e| LlmError::Network {
                message: format!("Failed to parse response: {}", e),
            })?;

        self.convert_response(gemini_response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "google_ai"
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    usage_metadata: Option<GeminiUsage>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
    total_token_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Protocol;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GoogleClient {
        let config = ResolvedLlmConfig::new(
            Protocol::GoogleAI,
            server.uri(),
            "test-key".to_string(),
            "gemini-test".to_string(),
        );
        GoogleClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_chat_completion_maps_roles_and_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-test:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Thought1: "}, {"text": "hi"}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 7, "candidatesTokenCount": 3, "totalTokenCount": 10}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let response = client
            .chat_completion(
                vec![LlmMessage::system("rules"), LlmMessage::user("Query: hi")],
                None,
            )
            .await
            .unwrap();

        assert_eq!(response.message.content, "Thought1: hi");
        assert_eq!(response.finish_reason, Some(FinishReason::Stop));
        assert_eq!(response.usage.unwrap().total_tokens, 10);

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "rules");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_auth_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .chat_completion(vec![LlmMessage::user("q")], None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Llm(LlmError::Authentication { .. })
        ));
    }

    #[tokio::test]
    async fn test_no_candidates_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .chat_completion(vec![LlmMessage::user("q")], None)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::Error::Llm(LlmError::EmptyResponse)));
    }
}
