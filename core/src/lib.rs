//! # tinyreact core
//!
//! Core library for tinyreact, a minimal "reason then act" agent.
//!
//! A [`ReactAgent`] alternates between asking a language model for a thought
//! and an action, running the named tool and feeding the observation back,
//! until the model answers or the iteration limit (`ttl`) is reached.

pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod output;
pub mod tools;
pub mod trajectory;
pub mod transcript;

// Re-export commonly used types
pub use agent::{AgentBuilder, AgentConfig, AgentExecution, Outcome, ReactAgent};
pub use config::{ModelParams, Protocol, ResolvedLlmConfig};
pub use error::{Error, Result};
pub use transcript::{Action, Observation, Step, Transcript};
pub use trajectory::TrajectoryRecorder;

/// Current version of the tinyreact-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for the library
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

/// Initialize tracing with a specific debug mode
pub fn init_tracing_with_debug(debug: bool) {
    let filter = if debug { "debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}
