//! LLM message structures

use serde::{Deserialize, Serialize};

/// Represents a message in an LLM conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    /// Role of the message sender
    pub role: MessageRole,

    /// Text content of the message
    pub content: String,
}

/// Role of the message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System message (instructions)
    System,

    /// User message (query, observations)
    User,

    /// Assistant message (model reasoning)
    Assistant,
}

impl LlmMessage {
    /// Create a new system message
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a new user message
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Get the text content of the message
    pub fn text(&self) -> &str {
        &self.content
    }
}

/// Split out the system messages, joined, from the rest of the conversation.
///
/// Providers that take the system prompt as a separate request field use this.
pub fn split_system(messages: Vec<LlmMessage>) -> (Option<String>, Vec<LlmMessage>) {
    let mut system_parts = Vec::new();
    let mut conversation = Vec::new();

    for message in messages {
        match message.role {
            MessageRole::System => system_parts.push(message.content),
            _ => conversation.push(message),
        }
    }

    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };

    (system, conversation)
}
