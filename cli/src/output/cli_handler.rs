//! CLI output handler implementation

use async_trait::async_trait;
use colored::Colorize;
use tinyreact_core::agent::{parse_response, ParsedStep};
use tinyreact_core::output::{AgentEvent, AgentOutput, MessageLevel, ToolExecutionStatus};
use tracing::{debug, error, info, warn};

/// CLI output configuration
#[derive(Debug, Clone, Default)]
pub struct CliOutputConfig {
    /// Show run details: tool dispatch, token usage and statistics
    pub debug: bool,
}

/// CLI output handler that prints the run as a colored transcript
pub struct CliOutputHandler {
    config: CliOutputConfig,
}

impl CliOutputHandler {
    /// Create a new CLI output handler
    pub fn new(config: CliOutputConfig) -> Self {
        Self { config }
    }
}

/// Text of a model response worth echoing. The answer itself is printed once
/// the run completes, so an answering response only shows its reasoning.
fn thinking_text(response: &str) -> Option<String> {
    match parse_response(response) {
        // A bare answer comes back with the whole response as its reasoning
        ParsedStep::ReasoningWithAnswer { reasoning, .. } => {
            let reasoning = reasoning.trim();
            (!reasoning.is_empty() && reasoning != response.trim())
                .then(|| format!("Thought: {}", reasoning))
        }
        _ => {
            let response = response.trim();
            (!response.is_empty()).then(|| response.to_string())
        }
    }
}

#[async_trait]
impl AgentOutput for CliOutputHandler {
    async fn emit_event(
        &self,
        event: AgentEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match event {
            AgentEvent::ExecutionStarted { context } => {
                debug!("Starting run with model {}", context.model);
                println!("{}", format!("Query: {}", context.query).purple());
                if self.config.debug {
                    println!(
                        "{}",
                        format!(
                            "model: {} | ttl: {} | tools: {}",
                            context.model,
                            context.ttl,
                            context.tools.join(", ")
                        )
                        .dimmed()
                    );
                }
            }

            AgentEvent::AgentThinking {
                iteration: _,
                response,
            } => {
                if let Some(text) = thinking_text(&response) {
                    println!("{}", text.blue());
                }
            }

            AgentEvent::ToolExecutionStarted { tool_info } => {
                if self.config.debug {
                    println!(
                        "{}",
                        format!("-> {}({})", tool_info.tool_name, tool_info.arguments).dimmed()
                    );
                }
            }

            AgentEvent::ToolExecutionCompleted { tool_info } => {
                let observation = tool_info.observation.as_deref().unwrap_or_default();
                let line = format!("Observation{}: {}", tool_info.iteration, observation);
                match tool_info.status {
                    ToolExecutionStatus::Error if self.config.debug => {
                        println!("{}", line.yellow().bold())
                    }
                    _ => println!("{}", line.yellow()),
                }
            }

            AgentEvent::StepCompleted { step } => {
                if step.action.is_none() {
                    println!("{}", "(no action)".dimmed());
                }
            }

            AgentEvent::TokenUsageUpdated { token_usage } => {
                debug!("Tokens so far: {}", token_usage.total_tokens);
            }

            AgentEvent::ExecutionCompleted {
                context,
                success,
                summary,
            } => {
                if success {
                    println!("{}", format!("Answer: {}", summary).green());
                } else {
                    println!("{}", format!("Terminate: {}", summary).red());
                }

                if self.config.debug {
                    println!("Iterations: {}", context.iterations);
                    let token_usage = &context.token_usage;
                    if token_usage.total_tokens > 0 {
                        println!(
                            "Tokens: {} input + {} output = {} total",
                            token_usage.input_tokens,
                            token_usage.output_tokens,
                            token_usage.total_tokens
                        );
                    }
                }
            }

            AgentEvent::Message {
                level,
                content,
                metadata: _,
            } => match level {
                MessageLevel::Debug => debug!("{}", content),
                MessageLevel::Info => info!("{}", content),
                MessageLevel::Normal => println!("{}", content),
                MessageLevel::Warning => warn!("{}", content),
                MessageLevel::Error => error!("{}", content),
            },
        }

        Ok(())
    }

    async fn flush(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        use std::io::Write;
        std::io::stdout().flush().map_err(|e| e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answering_response_shows_only_reasoning() {
        assert_eq!(
            thinking_text("Thought: 2 plus 2 is 4.\nAnswer: 4").as_deref(),
            Some("Thought: 2 plus 2 is 4.")
        );
        assert_eq!(thinking_text("Final Answer: 4"), None);
    }

    #[test]
    fn test_acting_response_is_echoed_verbatim() {
        let response = "Thought1: add\nAction1: add_numbers(2, 2)\n";
        assert_eq!(
            thinking_text(response).as_deref(),
            Some("Thought1: add\nAction1: add_numbers(2, 2)")
        );
        assert_eq!(thinking_text("   "), None);
    }
}
