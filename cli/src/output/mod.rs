//! CLI-specific output implementations
//!
//! Renders agent events as a colored transcript on the terminal.

pub mod cli_handler;

pub use cli_handler::{CliOutputConfig, CliOutputHandler};
