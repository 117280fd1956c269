//! Tool system and built-in tools

pub mod arguments;
pub mod base;
pub mod builtin;
pub mod registry;

pub use arguments::ActionArguments;
pub use base::{Tool, ToolCall, ToolExample, ToolExecutor, ToolResult};
pub use registry::{default_tool_names, ToolFactory, ToolRegistry};
