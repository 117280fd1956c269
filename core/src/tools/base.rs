//! Base tool traits and structures

use crate::error::{Result, ToolError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Trait for all tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the name of the tool
    fn name(&self) -> &str;

    /// Get the description of the tool
    fn description(&self) -> &str;

    /// Get the JSON schema for the tool's parameters
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given parameters
    async fn execute(&self, call: ToolCall) -> Result<ToolResult>;

    /// Parameter names in the order positional arguments bind to them.
    ///
    /// Required parameters come first, in schema order, followed by the
    /// remaining properties.
    fn argument_order(&self) -> Vec<String> {
        let schema = self.parameters_schema();
        let mut order: Vec<String> = schema
            .get("required")
            .and_then(|r| r.as_array())
            .map(|names| {
                names
                    .iter()
                    .filter_map(|n| n.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        if let Some(properties) = schema.get("properties").and_then(|p| p.as_object()) {
            for name in properties.keys() {
                if !order.contains(name) {
                    order.push(name.clone());
                }
            }
        }

        order
    }

    /// Get examples of how to use this tool
    fn examples(&self) -> Vec<ToolExample> {
        Vec::new()
    }
}

/// A call to a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,

    /// Name of the tool to call
    pub name: String,

    /// Parameters to pass to the tool, as a JSON object
    pub parameters: serde_json::Value,
}

/// Result of a tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this is a result for
    pub tool_call_id: String,

    /// Whether the execution was successful
    pub success: bool,

    /// Result content
    pub content: String,

    /// Optional structured data
    pub data: Option<serde_json::Value>,

    /// Execution duration in milliseconds
    pub duration_ms: Option<u64>,
}

/// Example usage of a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExample {
    /// Description of what this example does
    pub description: String,

    /// Example parameters
    pub parameters: serde_json::Value,

    /// Expected result description
    pub expected_result: String,
}

/// Tool executor that dispatches tool calls by name
pub struct ToolExecutor {
    tools: HashMap<String, Box<dyn Tool>>,
    order: Vec<String>,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new<S: Into<String>>(name: S, parameters: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            parameters,
        }
    }

    /// Get a parameter value by key
    pub fn get_parameter<T>(&self, key: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let value = self
            .parameters
            .get(key)
            .ok_or_else(|| ToolError::InvalidParameters {
                message: format!("Missing parameter: {}", key),
            })?;

        serde_json::from_value(value.clone()).map_err(|_| {
            ToolError::InvalidParameters {
                message: format!("Invalid parameter type for: {}", key),
            }
            .into()
        })
    }

    /// Get a parameter value by key with a default
    pub fn get_parameter_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        match self.parameters.get(key) {
            None | Some(serde_json::Value::Null) => Ok(default),
            Some(_) => self.get_parameter(key),
        }
    }

    /// Get a numeric parameter, accepting numbers written as strings
    pub fn get_number(&self, key: &str) -> Result<f64> {
        match self.parameters.get(key) {
            Some(serde_json::Value::Number(n)) => n.as_f64().ok_or_else(|| {
                ToolError::InvalidParameters {
                    message: format!("Parameter '{}' is not a finite number", key),
                }
                .into()
            }),
            Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().map_err(|_| {
                ToolError::InvalidParameters {
                    message: format!("Parameter '{}' expects a number, got '{}'", key, s),
                }
                .into()
            }),
            Some(other) => Err(ToolError::InvalidParameters {
                message: format!("Parameter '{}' expects a number, got {}", key, other),
            }
            .into()),
            None => Err(ToolError::InvalidParameters {
                message: format!("Missing parameter: {}", key),
            }
            .into()),
        }
    }
}

impl ToolResult {
    /// Create a successful result
    pub fn success<S: Into<String>>(tool_call_id: S, content: S) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            success: true,
            content: content.into(),
            data: None,
            duration_ms: None,
        }
    }

    /// Create an error result
    pub fn error<S: Into<String>>(tool_call_id: S, error: S) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            success: false,
            content: error.into(),
            data: None,
            duration_ms: None,
        }
    }

    /// Set structured data
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Set execution duration
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

impl ToolExecutor {
    /// Create a new tool executor
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a tool. A tool with the same name replaces the earlier one
    /// but keeps its position.
    pub fn register_tool(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        if !self.tools.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.tools.insert(name, tool);
    }

    /// Get a tool by name
    pub fn get_tool(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// List all available tools in registration order
    pub fn list_tools(&self) -> Vec<&str> {
        self.order.iter().map(|s| s.as_str()).collect()
    }

    /// Iterate over tools in registration order
    pub fn tools(&self) -> impl Iterator<Item = &dyn Tool> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name).map(|t| t.as_ref()))
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no tools are registered
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Execute a tool call.
    ///
    /// Returns `ToolError::NotFound` for unknown tools; failures raised by the
    /// tool itself come back as an unsuccessful `ToolResult`.
    pub async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let tool = self
            .get_tool(&call.name)
            .ok_or_else(|| ToolError::NotFound {
                name: call.name.clone(),
            })?;

        let start_time = std::time::Instant::now();
        let call_id = call.id.clone();
        let result = tool.execute(call).await;
        let duration = start_time.elapsed().as_millis() as u64;

        match result {
            Ok(result) => Ok(result.with_duration(duration)),
            Err(e) => {
                Ok(ToolResult::error(call_id, error_message(&e)).with_duration(duration))
            }
        }
    }
}

impl Default for ToolExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Tool errors without the outer "Tool error:" wrapper
pub(crate) fn error_message(error: &crate::error::Error) -> String {
    match error {
        crate::error::Error::Tool(inner) => inner.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes its input"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({
                "type": "object",
                "properties": {
                    "times": {"type": "integer"},
                    "text": {"type": "string"}
                },
                "required": ["text"]
            })
        }

        async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
            let text: String = call.get_parameter("text")?;
            let times: usize = call.get_parameter_or("times", 1)?;
            Ok(ToolResult::success(call.id, text.repeat(times)))
        }
    }

    #[test]
    fn test_argument_order_puts_required_first() {
        assert_eq!(EchoTool.argument_order(), vec!["text", "times"]);
    }

    #[test]
    fn test_get_number_accepts_numeric_strings() {
        let call = ToolCall::new("x", json!({"a": 3, "b": " 2.5 ", "c": "abc", "d": true}));
        assert_eq!(call.get_number("a").unwrap(), 3.0);
        assert_eq!(call.get_number("b").unwrap(), 2.5);
        assert!(call.get_number("c").is_err());
        assert!(call.get_number("d").is_err());
        assert!(call.get_number("missing").is_err());
    }

    #[tokio::test]
    async fn test_executor_dispatches_and_converts_failures() {
        let mut executor = ToolExecutor::new();
        executor.register_tool(Box::new(EchoTool));

        let ok = executor
            .execute(ToolCall::new("echo", json!({"text": "ab", "times": 2})))
            .await
            .unwrap();
        assert!(ok.success);
        assert_eq!(ok.content, "abab");
        assert!(ok.duration_ms.is_some());

        let failed = executor
            .execute(ToolCall::new("echo", json!({})))
            .await
            .unwrap();
        assert!(!failed.success);
        assert!(failed.content.contains("Missing parameter: text"));

        let missing = executor.execute(ToolCall::new("nope", json!({}))).await;
        assert!(matches!(
            missing,
            Err(crate::error::Error::Tool(ToolError::NotFound { .. }))
        ));
    }

    #[test]
    fn test_register_keeps_order() {
        let mut executor = ToolExecutor::new();
        executor.register_tool(Box::new(EchoTool));
        executor.register_tool(Box::new(EchoTool));
        assert_eq!(executor.list_tools(), vec!["echo"]);
        assert_eq!(executor.len(), 1);
    }
}
