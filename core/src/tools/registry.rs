//! Tool registry for managing available tools

use crate::error::{ConfigError, Result};
use crate::tools::{Tool, ToolExecutor};
use std::collections::HashMap;

/// Registry for managing tool creation and registration
pub struct ToolRegistry {
    factories: HashMap<String, Box<dyn ToolFactory>>,
    order: Vec<String>,
}

/// Factory trait for creating tools
pub trait ToolFactory: Send + Sync {
    /// Create a new instance of the tool
    fn create(&self) -> Box<dyn Tool>;

    /// Get the name of the tool this factory creates
    fn tool_name(&self) -> &str;

    /// Get the description of the tool this factory creates
    fn tool_description(&self) -> &str;
}

impl ToolRegistry {
    /// Create a new, empty tool registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a tool factory
    pub fn register_factory(&mut self, factory: Box<dyn ToolFactory>) {
        let name = factory.tool_name().to_string();
        if !self.factories.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.factories.insert(name, factory);
    }

    /// Create a tool by name
    pub fn create_tool(&self, name: &str) -> Option<Box<dyn Tool>> {
        self.factories.get(name).map(|factory| factory.create())
    }

    /// List all available tool names in registration order
    pub fn list_tools(&self) -> Vec<&str> {
        self.order.iter().map(|s| s.as_str()).collect()
    }

    /// Get tool information
    pub fn get_tool_info(&self, name: &str) -> Option<(&str, &str)> {
        self.factories
            .get(name)
            .map(|factory| (factory.tool_name(), factory.tool_description()))
    }

    /// Create a tool executor with the specified tools, in the given order
    pub fn create_executor(&self, tool_names: &[String]) -> Result<ToolExecutor> {
        let mut executor = ToolExecutor::new();

        for name in tool_names {
            let tool = self
                .create_tool(name)
                .ok_or_else(|| ConfigError::UnknownTool { name: name.clone() })?;
            executor.register_tool(tool);
        }

        Ok(executor)
    }

    /// Create a tool executor with all available tools
    pub fn create_executor_with_all(&self) -> ToolExecutor {
        let mut executor = ToolExecutor::new();

        for name in &self.order {
            if let Some(tool) = self.create_tool(name) {
                executor.register_tool(tool);
            }
        }

        executor
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        use crate::tools::builtin::*;

        let mut registry = Self::new();

        registry.register_factory(Box::new(AddNumbersToolFactory));
        registry.register_factory(Box::new(SubtractNumbersToolFactory));
        registry.register_factory(Box::new(MultiplyNumbersToolFactory));
        registry.register_factory(Box::new(DivideNumbersToolFactory));
        registry.register_factory(Box::new(GetTemperatureToolFactory));
        registry.register_factory(Box::new(SearchWikipediaPageToolFactory));
        registry.register_factory(Box::new(WikipediaCoordinatesToolFactory));
        registry.register_factory(Box::new(WikipediaSummaryToolFactory));

        registry
    }
}

/// Names of the built-in tools, in registration order
pub fn default_tool_names() -> Vec<String> {
    ToolRegistry::default()
        .list_tools()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Macro to help implement tool factories
#[macro_export]
macro_rules! impl_tool_factory {
    ($factory:ident, $create:expr, $name:expr, $description:expr) => {
        pub struct $factory;

        impl $crate::tools::ToolFactory for $factory {
            fn create(&self) -> Box<dyn $crate::tools::Tool> {
                Box::new($create)
            }

            fn tool_name(&self) -> &str {
                $name
            }

            fn tool_description(&self) -> &str {
                $description
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPECTED_TOOLS: [&str; 8] = [
        "add_numbers",
        "subtract_numbers",
        "multiply_numbers",
        "divide_numbers",
        "get_temperature",
        "search_wikipedia_page",
        "wikipedia_coordinates",
        "wikipedia_summary",
    ];

    #[test]
    fn test_default_registry_has_all_tools_in_order() {
        let registry = ToolRegistry::default();
        assert_eq!(registry.list_tools(), EXPECTED_TOOLS.to_vec());
        assert_eq!(default_tool_names().len(), EXPECTED_TOOLS.len());
    }

    #[test]
    fn test_tool_creation_matches_factory() {
        let registry = ToolRegistry::default();

        for tool_name in EXPECTED_TOOLS {
            let tool = registry
                .create_tool(tool_name)
                .unwrap_or_else(|| panic!("Failed to create tool '{}'", tool_name));
            assert_eq!(tool.name(), tool_name, "Tool name mismatch for '{}'", tool_name);
            assert!(
                !tool.description().is_empty(),
                "Tool '{}' has empty description",
                tool_name
            );

            let (name, description) = registry.get_tool_info(tool_name).unwrap();
            assert_eq!(name, tool_name);
            assert!(!description.is_empty());
        }
    }

    #[test]
    fn test_tool_parameter_schemas() {
        let registry = ToolRegistry::default();

        for tool_name in registry.list_tools() {
            let tool = registry.create_tool(tool_name).unwrap();
            let schema = tool.parameters_schema();

            assert_eq!(
                schema["type"], "object",
                "Tool '{}' schema type is not 'object'",
                tool_name
            );
            let props = schema["properties"].as_object().unwrap();
            assert!(!props.is_empty(), "Tool '{}' has no properties", tool_name);
            assert!(!tool.argument_order().is_empty());
        }
    }

    #[test]
    fn test_tool_examples() {
        let registry = ToolRegistry::default();

        for tool_name in registry.list_tools() {
            let tool = registry.create_tool(tool_name).unwrap();
            let examples = tool.examples();
            assert!(!examples.is_empty(), "Tool '{}' has no examples", tool_name);
            for example in examples {
                assert!(example.parameters.is_object());
                assert!(!example.description.is_empty());
            }
        }
    }

    #[test]
    fn test_create_executor_keeps_requested_order() {
        let registry = ToolRegistry::default();
        let names = vec!["wikipedia_summary".to_string(), "add_numbers".to_string()];
        let executor = registry.create_executor(&names).unwrap();
        assert_eq!(executor.list_tools(), vec!["wikipedia_summary", "add_numbers"]);
    }

    #[test]
    fn test_create_executor_rejects_unknown_tool() {
        let registry = ToolRegistry::default();
        let result = registry.create_executor(&["bash".to_string()]);
        assert!(matches!(
            result,
            Err(crate::error::Error::Config(ConfigError::UnknownTool { .. }))
        ));
    }

    #[test]
    fn test_create_executor_with_all() {
        let executor = ToolRegistry::default().create_executor_with_all();
        assert_eq!(executor.len(), EXPECTED_TOOLS.len());
    }
}
