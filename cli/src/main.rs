//! # tinyreact CLI
//!
//! Command-line interface for tinyreact - a minimal reason-then-act agent.
//!
//! ## Usage
//!
//! - `tinyreact "question"` - Answer a question, printing the thinking trace
//! - `tinyreact tools` - Show available tools
//!
//! Exit status is 0 when the model answered, 2 when the iteration limit was
//! reached without an answer and 1 on any error.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod config;
mod output;

use commands::{run_command, tools_command, RunOptions};
use config::CliConfigLoader;

/// Exit status for a run that ended without an answer
const EXIT_EXHAUSTED: u8 = 2;

/// tinyreact - A minimal reason-then-act agent
#[derive(Parser)]
#[command(name = "tinyreact")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Answer questions with a language model that reasons and calls tools")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file or directory path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Protocol to use (google_ai, openai, anthropic)
    #[arg(long)]
    protocol: Option<String>,

    /// API key override
    #[arg(long)]
    api_key: Option<String>,

    /// Base URL override
    #[arg(long)]
    base_url: Option<String>,

    /// Model name override
    #[arg(long)]
    model: Option<String>,

    /// Maximum number of iterations
    #[arg(long)]
    ttl: Option<usize>,

    /// Comma-separated list of tools to offer the model
    #[arg(long, value_delimiter = ',')]
    tools: Option<Vec<String>>,

    /// File with a custom instruction template; `{tool_prompt}` marks the tool listing
    #[arg(long)]
    prompt_file: Option<PathBuf>,

    /// Output trajectory file
    #[arg(long)]
    trajectory_file: Option<PathBuf>,

    /// Write the thinking trace as a Mermaid diagram to this file
    #[arg(long)]
    mermaid: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output mode (default is normal mode)
    #[arg(short = 'd', long = "debug")]
    debug_output: bool,

    /// The question to answer
    query: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show available tools
    Tools {
        /// Print each tool as it appears in the instruction prompt
        #[arg(long)]
        detailed: bool,
    },
}

/// Build a configuration loader from CLI arguments
fn build_config_loader(cli: &Cli) -> CliConfigLoader {
    let mut loader = CliConfigLoader::new();

    if let Some(config_path) = &cli.config {
        loader = loader.with_config_override(config_path.clone());
    }

    if let Some(protocol) = &cli.protocol {
        loader = loader.with_protocol_override(protocol.clone());
    }

    if let Some(api_key) = &cli.api_key {
        loader = loader.with_api_key_override(api_key.clone());
    }

    if let Some(base_url) = &cli.base_url {
        loader = loader.with_base_url_override(base_url.clone());
    }

    if let Some(model) = &cli.model {
        loader = loader.with_model_override(model.clone());
    }

    loader
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr so they never mix with the transcript
    let filter = if cli.verbose || cli.debug_output {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config_loader = build_config_loader(&cli);

    match (cli.query, cli.command) {
        (Some(query), None) => {
            let options = RunOptions {
                ttl: cli.ttl,
                tools: cli.tools,
                prompt_file: cli.prompt_file,
                trajectory_file: cli.trajectory_file,
                mermaid: cli.mermaid,
                debug_output: cli.debug_output,
            };
            if run_command(query, config_loader, options).await? {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(EXIT_EXHAUSTED))
            }
        }
        (Some(_), Some(_)) => Err(anyhow!("Cannot specify both a query and a subcommand")),
        (None, Some(Commands::Tools { detailed })) => {
            tools_command(detailed)?;
            Ok(ExitCode::SUCCESS)
        }
        (None, None) => Err(anyhow!(
            "No query given. Run `tinyreact --help` for usage"
        )),
    }
}
