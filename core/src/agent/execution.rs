//! Run results

use crate::output::TokenUsage;
use crate::transcript::Transcript;
use serde::{Deserialize, Serialize};

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The model produced a final answer
    Answer {
        text: String,
        reasoning: String,
        transcript: Transcript,
    },
    /// The iteration limit was reached without an answer
    Exhausted { transcript: Transcript },
}

impl Outcome {
    pub fn is_answer(&self) -> bool {
        matches!(self, Outcome::Answer { .. })
    }

    /// The final answer, if any
    pub fn answer(&self) -> Option<&str> {
        match self {
            Outcome::Answer { text, .. } => Some(text),
            Outcome::Exhausted { .. } => None,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        match self {
            Outcome::Answer { transcript, .. } | Outcome::Exhausted { transcript } => transcript,
        }
    }

    /// Plain text rendering of the whole run
    pub fn render(&self) -> String {
        self.transcript().render(self.answer())
    }

    /// Mermaid diagram of the whole run
    pub fn to_mermaid(&self) -> String {
        self.transcript().to_mermaid(self.answer())
    }
}

/// Outcome of a run together with its statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentExecution {
    pub outcome: Outcome,

    /// Number of completion calls made
    pub iterations: usize,

    /// Number of tool invocations that reached a tool
    pub tool_invocations: usize,

    /// Total execution time in milliseconds
    pub duration_ms: u64,

    pub token_usage: TokenUsage,
}

impl AgentExecution {
    /// Whether the run ended with an answer
    pub fn success(&self) -> bool {
        self.outcome.is_answer()
    }

    pub fn answer(&self) -> Option<&str> {
        self.outcome.answer()
    }

    pub fn transcript(&self) -> &Transcript {
        self.outcome.transcript()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors() {
        let answer = Outcome::Answer {
            text: "42".to_string(),
            reasoning: "known".to_string(),
            transcript: Transcript::new("q"),
        };
        assert!(answer.is_answer());
        assert_eq!(answer.answer(), Some("42"));
        assert!(answer.render().contains("Answer: 42"));

        let exhausted = Outcome::Exhausted {
            transcript: Transcript::new("q"),
        };
        assert_eq!(exhausted.answer(), None);
        assert_eq!(exhausted.transcript().query(), "q");
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let exhausted = Outcome::Exhausted {
            transcript: Transcript::new("q"),
        };
        let value = serde_json::to_value(&exhausted).unwrap();
        assert_eq!(value["status"], "exhausted");
        assert_eq!(value["transcript"]["query"], "q");
    }
}
