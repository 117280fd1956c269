//! Tools listing command

use anyhow::Result;
use colored::Colorize;
use tinyreact_core::agent::tool_listing;
use tinyreact_core::tools::ToolRegistry;
use tracing::info;

/// Show the built-in tools. With `detailed`, print them exactly as the
/// model sees them in the instruction prompt.
pub fn tools_command(detailed: bool) -> Result<()> {
    info!("Listing available tools");

    let registry = ToolRegistry::default();

    if detailed {
        println!("{}", tool_listing(&registry.create_executor_with_all()));
        return Ok(());
    }

    println!("Available tools:\n");
    for name in registry.list_tools() {
        if let Some((tool_name, description)) = registry.get_tool_info(name) {
            // First line of the description only
            let first_line = description.lines().next().unwrap_or(description);
            println!("  {} {}", format!("{:<24}", tool_name).bold(), first_line);
        }
    }

    Ok(())
}
