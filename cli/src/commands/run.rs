//! Single query execution command

use anyhow::{Context, Result};
use std::path::PathBuf;
use tinyreact_core::{AgentBuilder, TrajectoryRecorder};
use tracing::{debug, info};

use crate::config::CliConfigLoader;
use crate::output::{CliOutputConfig, CliOutputHandler};

/// Per-run settings taken from the command line
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub ttl: Option<usize>,
    pub tools: Option<Vec<String>>,
    pub prompt_file: Option<PathBuf>,
    pub trajectory_file: Option<PathBuf>,
    pub mermaid: Option<PathBuf>,
    pub debug_output: bool,
}

/// Answer a single query. Returns whether the run ended with an answer.
pub async fn run_command(
    query: String,
    config_loader: CliConfigLoader,
    options: RunOptions,
) -> Result<bool> {
    info!("Answering query: {}", query);

    let loaded = config_loader.load().await?;
    info!("Using protocol: {}", loaded.llm.protocol.as_str());
    info!("Using model: {}", loaded.llm.model);

    let mut agent_config = loaded.agent;
    if let Some(ttl) = options.ttl {
        agent_config.ttl = ttl;
    }
    if let Some(tools) = options.tools {
        agent_config.tools = tools;
    }
    if let Some(prompt_file) = &options.prompt_file {
        let template = tokio::fs::read_to_string(prompt_file)
            .await
            .with_context(|| format!("Failed to read prompt file: {}", prompt_file.display()))?;
        agent_config.instruction_prompt = Some(template);
    }

    let cli_output = Box::new(CliOutputHandler::new(CliOutputConfig {
        debug: options.debug_output,
    }));

    let mut builder = AgentBuilder::new(loaded.llm)
        .with_agent_config(agent_config)
        .with_output(cli_output);
    if let Some(trajectory_file) = &options.trajectory_file {
        info!("Trajectory file: {}", trajectory_file.display());
        builder = builder.with_trajectory_recorder(TrajectoryRecorder::with_file(trajectory_file));
    }

    let agent = builder.build().context("Failed to build agent")?;
    debug!("Instruction prompt:\n{}", agent.instruction());

    let execution = agent.execute(&query).await?;

    if let Some(mermaid) = &options.mermaid {
        tokio::fs::write(mermaid, execution.outcome.to_mermaid())
            .await
            .with_context(|| format!("Failed to write diagram: {}", mermaid.display()))?;
        info!("Mermaid diagram saved to: {}", mermaid.display());
    }

    info!(
        "Run finished after {} iterations and {} tool invocations in {}ms",
        execution.iterations, execution.tool_invocations, execution.duration_ms
    );

    Ok(execution.success())
}
