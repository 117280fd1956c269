//! Example: running the agent with a custom instruction template
//!
//! The completion client here is a canned one, so the example runs offline.
//! Swap it for `AgentBuilder::new(config)` with a real `ResolvedLlmConfig`
//! to talk to a provider.

use async_trait::async_trait;
use std::sync::Arc;
use tinyreact_core::llm::{FinishReason, LlmClient, LlmMessage, LlmResponse};
use tinyreact_core::{AgentBuilder, Outcome};

/// Replies with a multiplication on the first turn and an answer afterwards
struct CannedClient;

#[async_trait]
impl LlmClient for CannedClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        _options: Option<tinyreact_core::llm::ChatOptions>,
    ) -> tinyreact_core::Result<LlmResponse> {
        let reply = if messages.len() == 1 {
            "Thought1: I should multiply.\nAction1: multiply_numbers(6, 7)"
        } else {
            "Thought2: The tool says 42.\nAnswer2: 42"
        };
        Ok(LlmResponse {
            message: LlmMessage::assistant(reply),
            usage: None,
            model: "canned".to_string(),
            finish_reason: Some(FinishReason::Stop),
        })
    }

    fn model_name(&self) -> &str {
        "canned"
    }

    fn provider_name(&self) -> &str {
        "example"
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let template = "You are a careful calculator. Use these tools:\n\n{tool_prompt}\n\n\
                    Reply with ThoughtN/ActionN lines, and AnswerN once you know the result.";

    let agent = AgentBuilder::with_llm_client(Arc::new(CannedClient))
        .with_ttl(3)
        .with_tools(vec!["multiply_numbers".to_string()])
        .with_instruction_prompt(Some(template.to_string()))
        .build()?;

    println!("=== Instruction ===\n{}\n", agent.instruction());

    let outcome = agent.run("What is 6 times 7?").await?;
    println!("=== Trace ===\n{}\n", outcome.render());

    if let Outcome::Answer { text, .. } = &outcome {
        println!("Answer: {}", text);
    }
    println!("\n=== Mermaid ===\n{}", outcome.to_mermaid());

    Ok(())
}
