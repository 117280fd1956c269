//! Instruction template and conversation building

use crate::llm::LlmMessage;
use crate::tools::{Tool, ToolExecutor};
use crate::transcript::Transcript;
use serde_json::Value;

/// Placeholder replaced by the tool listing
pub const TOOL_PROMPT_PLACEHOLDER: &str = "{tool_prompt}";

/// Default instruction template
pub const DEFAULT_INSTRUCTION_PROMPT: &str = r#"Solve the problem step by step using the thinking trace pattern and the tools below.

# TOOLS
{tool_prompt}

# EXAMPLE THINKING TRACE
## INPUT
Query: What is 10 * 3 + 10?

Thought1: First, I need to multiply 10 by 3.
Action1: multiply_numbers(10, 3)

Observation1: 30

## OUTPUT
Thought2: Now I need to add 10 to this result.
Action2: add_numbers(30, 10)

# RULES
1. Never write observations yourself. Observations are only given to you as input.
2. One action per turn. Each response contains a single Thought followed by either one Action or the Answer.
3. Think out loud in every Thought and explain your reasoning in at least three sentences.
4. Number every step with its iteration, as in Thought1 and Action1.
5. Only when you have the final answer, write it as:
Answer: [your final answer]
6. Phrase the final answer in the context of the original query and briefly list the steps you took as a numbered list.
7. If a tool does not return the information you need, try variations of the query. After 5 failed attempts, answer with an error.
8. Stick to the format shown above."#;

/// Heading placed between the instructions and the query
pub const THINKING_TRACE_HEADING: &str = "# THINKING TRACE";

/// Render one tool as a signature, description and example call
pub fn describe_tool(tool: &dyn Tool) -> String {
    let schema = tool.parameters_schema();
    let order = tool.argument_order();

    let params: Vec<String> = order
        .iter()
        .map(|name| match schema.pointer(&format!("/properties/{}/default", name)) {
            Some(default) => format!("{}={}", name, literal(default)),
            None => name.clone(),
        })
        .collect();

    let mut out = format!("{}({})\n{}", tool.name(), params.join(", "), tool.description());

    for name in &order {
        if let Some(description) = schema
            .pointer(&format!("/properties/{}/description", name))
            .and_then(Value::as_str)
        {
            out.push_str(&format!("\nparameter {}: {}", name, description));
        }
    }

    if let Some(example) = tool.examples().first() {
        out.push_str(&format!(
            "\nexample: {}",
            example_call(tool.name(), &order, &example.parameters)
        ));
    }

    out
}

/// The tool listing inserted into the instruction template
pub fn tool_listing(tools: &ToolExecutor) -> String {
    tools
        .tools()
        .map(describe_tool)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Fill the template with the tool listing, appending it when the template
/// has no placeholder
pub fn render_instruction(template: &str, tools: &ToolExecutor) -> String {
    let listing = tool_listing(tools);
    if template.contains(TOOL_PROMPT_PLACEHOLDER) {
        template.replace(TOOL_PROMPT_PLACEHOLDER, &listing)
    } else {
        format!("{}\n\n# TOOLS\n{}", template.trim_end(), listing)
    }
}

/// Build the conversation sent to the model for the next iteration.
///
/// User and assistant turns strictly alternate: every recorded step adds the
/// model's response and then either its observation or a format reminder.
pub fn build_messages(instruction: &str, transcript: &Transcript) -> Vec<LlmMessage> {
    let mut messages = Vec::with_capacity(1 + transcript.len() * 2);
    messages.push(LlmMessage::user(format!(
        "{}\n\n{}\n\nQuery: {}\n",
        instruction,
        THINKING_TRACE_HEADING,
        transcript.query()
    )));

    for step in transcript {
        messages.push(LlmMessage::assistant(step.response.clone()));
        let follow_up = match &step.observation {
            Some(observation) => format!("Observation{}: {}", step.iteration, observation.text),
            None => format_reminder(step.iteration + 1),
        };
        messages.push(LlmMessage::user(follow_up));
    }

    messages
}

fn format_reminder(next: usize) -> String {
    format!(
        "No action was found in your last response. Continue with Thought{next} followed by \
         either Action{next}: tool_name(arguments) or Answer: [your final answer]."
    )
}

fn example_call(name: &str, order: &[String], parameters: &Value) -> String {
    let Some(map) = parameters.as_object() else {
        return format!("{}()", name);
    };

    let mut args = Vec::new();
    let mut positional = true;
    for param in order {
        match map.get(param) {
            Some(value) if positional => args.push(literal(value)),
            Some(value) => args.push(format!("{}={}", param, literal(value))),
            None => positional = false,
        }
    }
    format!("{}({})", name, args.join(", "))
}

fn literal(value: &Value) -> String {
    match value {
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolRegistry;
    use crate::transcript::{Action, Observation, Step};
    use crate::llm::MessageRole;

    fn executor(names: &[&str]) -> ToolExecutor {
        let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        ToolRegistry::default().create_executor(&names).unwrap()
    }

    #[test]
    fn test_describe_tool_with_default_and_example() {
        let tools = executor(&["wikipedia_summary"]);
        let description = describe_tool(tools.get_tool("wikipedia_summary").unwrap());

        assert!(description.starts_with("wikipedia_summary(query, sentences=10)\n"));
        assert!(description.contains("parameter query:"));
        assert!(description
            .contains(r#"example: wikipedia_summary("President of the United States", 5)"#));
    }

    #[test]
    fn test_render_instruction() {
        let tools = executor(&["add_numbers", "divide_numbers"]);

        let rendered = render_instruction(DEFAULT_INSTRUCTION_PROMPT, &tools);
        assert!(!rendered.contains(TOOL_PROMPT_PLACEHOLDER));
        assert!(rendered.contains("add_numbers(x, y)"));
        assert!(rendered.contains("example: divide_numbers(10, 4)"));
        assert!(rendered.find("add_numbers(x, y)") < rendered.find("divide_numbers(x, y)"));

        let appended = render_instruction("Be brief.", &tools);
        assert!(appended.starts_with("Be brief.\n\n# TOOLS\nadd_numbers(x, y)"));
    }

    #[test]
    fn test_build_messages_alternates_roles() {
        let mut transcript = Transcript::new("What is 1 + 2?");
        transcript.push(Step::acted(
            1,
            "Thought1: add\nAction1: add_numbers(1, 2)",
            "add",
            Action::new("add_numbers", "1, 2"),
            Observation::success("3"),
        ));
        transcript.push(Step::reasoning(2, "thinking...", "thinking..."));

        let messages = build_messages("INSTRUCTIONS", &transcript);
        let roles: Vec<MessageRole> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User
            ]
        );
        assert_eq!(
            messages[0].content,
            "INSTRUCTIONS\n\n# THINKING TRACE\n\nQuery: What is 1 + 2?\n"
        );
        assert_eq!(messages[2].content, "Observation1: 3");
        assert!(messages[4].content.contains("Thought3"));
    }
}
