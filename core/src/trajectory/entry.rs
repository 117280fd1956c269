//! Trajectory entries

use crate::llm::{LlmMessage, Usage};
use crate::transcript::Step;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single recorded event of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryEntry {
    /// When the entry was recorded
    pub timestamp: DateTime<Utc>,

    /// Iteration the entry belongs to, 0 for run-level entries
    pub iteration: usize,

    #[serde(flatten)]
    pub entry_type: EntryType,
}

/// What was recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryType {
    TaskStart {
        query: String,
        config: serde_json::Value,
    },
    LlmRequest {
        messages: Vec<LlmMessage>,
        model: String,
        provider: String,
    },
    LlmResponse {
        content: String,
        usage: Option<Usage>,
        finish_reason: Option<String>,
    },
    Step {
        step: Step,
    },
    Error {
        message: String,
    },
    TaskComplete {
        success: bool,
        result: String,
        iterations: usize,
        duration_ms: u64,
    },
}

impl TrajectoryEntry {
    fn new(iteration: usize, entry_type: EntryType) -> Self {
        Self {
            timestamp: Utc::now(),
            iteration,
            entry_type,
        }
    }

    pub fn task_start(query: String, config: serde_json::Value) -> Self {
        Self::new(0, EntryType::TaskStart { query, config })
    }

    pub fn llm_request(
        messages: Vec<LlmMessage>,
        model: String,
        provider: String,
        iteration: usize,
    ) -> Self {
        Self::new(
            iteration,
            EntryType::LlmRequest {
                messages,
                model,
                provider,
            },
        )
    }

    pub fn llm_response(
        content: String,
        usage: Option<Usage>,
        finish_reason: Option<String>,
        iteration: usize,
    ) -> Self {
        Self::new(
            iteration,
            EntryType::LlmResponse {
                content,
                usage,
                finish_reason,
            },
        )
    }

    pub fn step(step: Step) -> Self {
        Self::new(step.iteration, EntryType::Step { step })
    }

    pub fn error(message: String, iteration: usize) -> Self {
        Self::new(iteration, EntryType::Error { message })
    }

    pub fn task_complete(success: bool, result: String, iterations: usize, duration_ms: u64) -> Self {
        Self::new(
            iterations,
            EntryType::TaskComplete {
                success,
                result,
                iterations,
                duration_ms,
            },
        )
    }
}
