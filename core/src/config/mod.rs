//! Minimal configuration module for tinyreact core
//!
//! Only exports pure data types. All loading logic is in CLI layer.

pub mod types;

pub use types::{ModelParams, Protocol, ResolvedLlmConfig};
