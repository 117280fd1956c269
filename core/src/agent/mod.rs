//! The reason-then-act agent

pub mod config;
pub mod core;
pub mod execution;
pub mod parser;
pub mod prompt;

pub use config::{AgentBuilder, AgentConfig, DEFAULT_TTL};
pub use self::core::ReactAgent;
pub use execution::{AgentExecution, Outcome};
pub use parser::{parse_response, ParsedStep};
pub use prompt::{build_messages, render_instruction, tool_listing, DEFAULT_INSTRUCTION_PROMPT};
