//! Output abstraction for agent runs
//!
//! The controller reports what happens during a run as [`AgentEvent`]s. The
//! core only defines the interface; the CLI renders the events to a terminal.

use crate::transcript::Step;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Null output handler that discards all events
pub struct NullOutput;

#[async_trait]
impl AgentOutput for NullOutput {
    async fn emit_event(
        &self,
        _event: AgentEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

/// Status of tool execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolExecutionStatus {
    /// Tool is currently executing
    Executing,
    /// Tool completed successfully
    Success,
    /// Tool failed, or the action could not be dispatched
    Error,
}

/// Information about one action taken by the agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExecutionInfo {
    /// Iteration the action belongs to
    pub iteration: usize,
    /// Tool name as requested by the model
    pub tool_name: String,
    /// Raw argument text
    pub arguments: String,
    /// Current execution status
    pub status: ToolExecutionStatus,
    /// Observation text, once available
    pub observation: Option<String>,
    /// Timestamp of status change
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ToolExecutionInfo {
    pub fn new(iteration: usize, tool_name: &str, arguments: &str) -> Self {
        Self {
            iteration,
            tool_name: tool_name.to_string(),
            arguments: arguments.to_string(),
            status: ToolExecutionStatus::Executing,
            observation: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Mark the execution finished with the given observation
    pub fn completed(mut self, observation: &str, is_error: bool) -> Self {
        self.status = if is_error {
            ToolExecutionStatus::Error
        } else {
            ToolExecutionStatus::Success
        };
        self.observation = Some(observation.to_string());
        self.timestamp = chrono::Utc::now();
        self
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TokenUsage {
    /// Total input tokens consumed
    pub input_tokens: u32,
    /// Total output tokens generated
    pub output_tokens: u32,
    /// Total tokens (input + output)
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn add(&mut self, usage: &crate::llm::Usage) {
        self.input_tokens += usage.prompt_tokens;
        self.output_tokens += usage.completion_tokens;
        self.total_tokens += usage.total_tokens;
    }
}

/// Run context information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// The query being answered
    pub query: String,
    /// Model answering it
    pub model: String,
    /// Maximum number of iterations
    pub ttl: usize,
    /// Tools available to the model, in listing order
    pub tools: Vec<String>,
    /// Iterations completed so far
    pub iterations: usize,
    /// Token usage statistics
    pub token_usage: TokenUsage,
}

/// Events that can be emitted during a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AgentEvent {
    /// Run started
    ExecutionStarted { context: ExecutionContext },
    /// Run finished, with an answer (`success`) or by exhausting its iterations
    ExecutionCompleted {
        context: ExecutionContext,
        success: bool,
        summary: String,
    },
    /// The model produced a response
    AgentThinking { iteration: usize, response: String },
    /// A tool call is about to run
    ToolExecutionStarted { tool_info: ToolExecutionInfo },
    /// A tool call finished, successfully or not
    ToolExecutionCompleted { tool_info: ToolExecutionInfo },
    /// An iteration without an answer was appended to the transcript
    StepCompleted { step: Step },
    /// Token usage updated (emitted after each LLM call)
    TokenUsageUpdated { token_usage: TokenUsage },
    /// General message or log
    Message {
        level: MessageLevel,
        content: String,
        metadata: HashMap<String, serde_json::Value>,
    },
}

/// Message severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageLevel {
    Debug,
    Info,
    Normal,
    Warning,
    Error,
}

/// Abstract output interface for agent runs
#[async_trait]
pub trait AgentOutput: Send + Sync {
    /// Emit an agent event
    async fn emit_event(
        &self,
        event: AgentEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Emit a message with specified level
    async fn emit_message(
        &self,
        level: MessageLevel,
        content: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.emit_event(AgentEvent::Message {
            level,
            content: content.to_string(),
            metadata: HashMap::new(),
        })
        .await
    }

    /// Emit debug message
    async fn debug(&self, content: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.emit_message(MessageLevel::Debug, content).await
    }

    /// Emit warning message
    async fn warning(&self, content: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.emit_message(MessageLevel::Warning, content).await
    }

    /// Emit error message
    async fn error(&self, content: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.emit_message(MessageLevel::Error, content).await
    }

    /// Flush any buffered output
    async fn flush(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_usage_accumulates() {
        let mut total = TokenUsage::default();
        let usage = crate::llm::Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        };
        total.add(&usage);
        total.add(&usage);
        assert_eq!(total.total_tokens, 30);
        assert_eq!(total.input_tokens, 20);
    }

    #[test]
    fn test_tool_execution_info_completion() {
        let info = ToolExecutionInfo::new(2, "add_numbers", "1, 2").completed("3", false);
        assert_eq!(info.status, ToolExecutionStatus::Success);
        assert_eq!(info.observation.as_deref(), Some("3"));

        let failed = ToolExecutionInfo::new(2, "nope", "").completed("Error", true);
        assert_eq!(failed.status, ToolExecutionStatus::Error);
    }
}
