//! Arithmetic tools

use crate::error::{Result, ToolError};
use crate::impl_tool_factory;
use crate::tools::{Tool, ToolCall, ToolExample, ToolResult};
use async_trait::async_trait;
use serde_json::json;

/// Binary arithmetic operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    fn name(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add_numbers",
            ArithmeticOp::Subtract => "subtract_numbers",
            ArithmeticOp::Multiply => "multiply_numbers",
            ArithmeticOp::Divide => "divide_numbers",
        }
    }

    fn description(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "Adds two numbers. Returns the sum of x and y.",
            ArithmeticOp::Subtract => {
                "Subtract second number from first number. Returns the difference x - y."
            }
            ArithmeticOp::Multiply => "Multiply two numbers. Returns the product of x and y.",
            ArithmeticOp::Divide => "Divides two numbers. Returns the quotient x / y.",
        }
    }

    fn apply(self, x: f64, y: f64) -> std::result::Result<f64, &'static str> {
        match self {
            ArithmeticOp::Add => Ok(x + y),
            ArithmeticOp::Subtract => Ok(x - y),
            ArithmeticOp::Multiply => Ok(x * y),
            ArithmeticOp::Divide if y == 0.0 => Err("division by zero"),
            ArithmeticOp::Divide => Ok(x / y),
        }
    }
}

/// Tool applying one arithmetic operation to two numbers
pub struct ArithmeticTool {
    op: ArithmeticOp,
}

impl ArithmeticTool {
    pub fn new(op: ArithmeticOp) -> Self {
        Self { op }
    }
}

#[async_trait]
impl Tool for ArithmeticTool {
    fn name(&self) -> &str {
        self.op.name()
    }

    fn description(&self) -> &str {
        self.op.description()
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "x": {
                    "type": "number",
                    "description": "The first number"
                },
                "y": {
                    "type": "number",
                    "description": "The second number"
                }
            },
            "required": ["x", "y"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let x = call.get_number("x")?;
        let y = call.get_number("y")?;

        let value = self
            .op
            .apply(x, y)
            .map_err(|message| ToolError::ExecutionFailed {
                name: self.name().to_string(),
                message: message.to_string(),
            })?;

        if !value.is_finite() {
            return Err(ToolError::ExecutionFailed {
                name: self.name().to_string(),
                message: "result is not a finite number".to_string(),
            }
            .into());
        }

        Ok(ToolResult::success(call.id, format_number(value)).with_data(json!(value)))
    }

    fn examples(&self) -> Vec<ToolExample> {
        let expected = self
            .op
            .apply(10.0, 4.0)
            .map(format_number)
            .unwrap_or_default();
        vec![ToolExample {
            description: format!("Apply {} to 10 and 4", self.name()),
            parameters: json!({"x": 10, "y": 4}),
            expected_result: expected,
        }]
    }
}

/// Render a number without a trailing `.0` when it is integral
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

impl_tool_factory!(
    AddNumbersToolFactory,
    ArithmeticTool::new(ArithmeticOp::Add),
    "add_numbers",
    "Adds two numbers."
);

impl_tool_factory!(
    SubtractNumbersToolFactory,
    ArithmeticTool::new(ArithmeticOp::Subtract),
    "subtract_numbers",
    "Subtract second number from first number."
);

impl_tool_factory!(
    MultiplyNumbersToolFactory,
    ArithmeticTool::new(ArithmeticOp::Multiply),
    "multiply_numbers",
    "Multiply two numbers."
);

impl_tool_factory!(
    DivideNumbersToolFactory,
    ArithmeticTool::new(ArithmeticOp::Divide),
    "divide_numbers",
    "Divides two numbers."
);

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(op: ArithmeticOp, params: serde_json::Value) -> Result<ToolResult> {
        ArithmeticTool::new(op)
            .execute(ToolCall::new(op.name(), params))
            .await
    }

    #[tokio::test]
    async fn test_operations() {
        assert_eq!(run(ArithmeticOp::Add, json!({"x": 30, "y": 10})).await.unwrap().content, "40");
        assert_eq!(
            run(ArithmeticOp::Subtract, json!({"x": 4, "y": 7})).await.unwrap().content,
            "-3"
        );
        assert_eq!(
            run(ArithmeticOp::Multiply, json!({"x": 2.5, "y": 3})).await.unwrap().content,
            "7.5"
        );
        assert_eq!(
            run(ArithmeticOp::Divide, json!({"x": 10, "y": 4})).await.unwrap().content,
            "2.5"
        );
    }

    #[tokio::test]
    async fn test_divide_by_zero_fails() {
        let err = run(ArithmeticOp::Divide, json!({"x": 1, "y": 0})).await.unwrap_err();
        assert!(err.to_string().contains("division by zero"));
    }

    #[tokio::test]
    async fn test_missing_argument_fails() {
        let err = run(ArithmeticOp::Add, json!({"x": 1})).await.unwrap_err();
        assert!(err.to_string().contains("Missing parameter: y"));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(40.0), "40");
        assert_eq!(format_number(-0.5), "-0.5");
        assert_eq!(format_number(1e20), "100000000000000000000");
    }
}
