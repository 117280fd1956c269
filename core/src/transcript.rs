//! Append-only record of a reasoning run and its renderings

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// An action requested by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Tool name as written by the model
    pub name: String,

    /// Raw argument text between the parentheses, or a JSON object body
    pub arguments: String,
}

impl Action {
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// The action written back as a call, e.g. `add_numbers(1, 2)`
    pub fn call_text(&self) -> String {
        let args = self.arguments.trim();
        if args.starts_with('{') {
            format!("{} {}", self.name, args)
        } else {
            format!("{}({})", self.name, args)
        }
    }
}

/// Result of acting on an [`Action`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub text: String,

    /// Whether the text describes a failure
    pub is_error: bool,
}

impl Observation {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// One iteration of the loop that did not produce an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// 1-based iteration number
    pub iteration: usize,

    /// Raw model response
    pub response: String,

    /// Reasoning extracted from the response
    pub reasoning: String,

    pub action: Option<Action>,

    /// Present only when an action was taken
    pub observation: Option<Observation>,
}

impl Step {
    /// A step where the model only reasoned
    pub fn reasoning(iteration: usize, response: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            iteration,
            response: response.into(),
            reasoning: reasoning.into(),
            action: None,
            observation: None,
        }
    }

    /// A step where the model acted and got an observation back
    pub fn acted(
        iteration: usize,
        response: impl Into<String>,
        reasoning: impl Into<String>,
        action: Action,
        observation: Observation,
    ) -> Self {
        Self {
            iteration,
            response: response.into(),
            reasoning: reasoning.into(),
            action: Some(action),
            observation: Some(observation),
        }
    }
}

/// Ordered steps of one run, together with the query that started it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    query: String,
    steps: Vec<Step>,
}

impl Transcript {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            steps: Vec::new(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    /// Number of steps that carried an action
    pub fn action_count(&self) -> usize {
        self.steps.iter().filter(|s| s.action.is_some()).count()
    }

    pub(crate) fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    /// Plain text rendering, ending with the answer or a termination line
    pub fn render(&self, answer: Option<&str>) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Query: {}", self.query);

        for step in &self.steps {
            out.push('\n');
            let _ = writeln!(out, "{}", step.response.trim());
            match &step.observation {
                Some(observation) => {
                    let _ = writeln!(out, "Observation{}: {}", step.iteration, observation.text);
                }
                None => {
                    let _ = writeln!(out, "(no action)");
                }
            }
        }

        out.push('\n');
        match answer {
            Some(answer) => {
                let _ = writeln!(out, "Answer: {}", answer);
            }
            None => {
                let _ = writeln!(out, "Terminate: Reached maximum number of iterations");
            }
        }
        out
    }

    /// Mermaid `graph TD` diagram of the run
    pub fn to_mermaid(&self, answer: Option<&str>) -> String {
        let mut lines = vec!["graph TD".to_string()];
        let mut node = 0usize;
        let mut next_id = || {
            let id = format!("node{}", node);
            node += 1;
            id
        };

        let question = next_id();
        lines.push(format!(
            "{}([\"Question: {}\"]):::question",
            question,
            escape_mermaid(&self.query)
        ));

        let mut ids = vec![question];
        for step in &self.steps {
            lines.push(format!(
                "subgraph Iteration_{}[\"Iteration {}\"]",
                step.iteration, step.iteration
            ));

            let mut nodes = vec![(step.reasoning.clone(), "thought")];
            if let Some(action) = &step.action {
                nodes.push((action.call_text(), "action"));
            }
            if let Some(observation) = &step.observation {
                nodes.push((observation.text.clone(), "observation"));
            }

            for (text, class) in nodes {
                let id = next_id();
                lines.push(format!("{}([\"{}\"]):::{}", id, escape_mermaid(&text), class));
                ids.push(id);
            }
            lines.push("end".to_string());
            lines.push(format!("class Iteration_{} iteration", step.iteration));
        }

        if let Some(answer) = answer {
            let id = next_id();
            lines.push(format!("{}([\"{}\"]):::answer", id, escape_mermaid(answer)));
            ids.push(id);
        }

        for pair in ids.windows(2) {
            lines.push(format!("{} --> {}", pair[0], pair[1]));
        }

        for (class, style) in MERMAID_STYLES {
            lines.push(format!("classDef {} {}", class, style));
        }

        lines.join("\n")
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

const MERMAID_STYLES: [(&str, &str); 6] = [
    (
        "question",
        "fill:#2C3E50,stroke:#34495E,stroke-width:2px,color:#ECF0F1,font-size:12px",
    ),
    (
        "thought",
        "fill:#3498DB,stroke:#2980B9,stroke-width:2px,color:#ECF0F1,font-size:12px",
    ),
    (
        "action",
        "fill:#27AE60,stroke:#219A52,stroke-width:2px,color:#ECF0F1,font-size:12px",
    ),
    (
        "observation",
        "fill:#E67E22,stroke:#D35400,stroke-width:2px,color:#ECF0F1,font-size:12px",
    ),
    (
        "answer",
        "fill:#2C3E50,stroke:#27AE60,stroke-width:2px,color:#ECF0F1,font-size:12px",
    ),
    (
        "iteration",
        "stroke-dasharray: 5 5,stroke:#666,stroke-width:2px,fill:none",
    ),
];

/// Make text safe inside a quoted Mermaid node label
pub fn escape_mermaid(text: &str) -> String {
    text.replace('"', "'")
        .replace(['\r', '\n'], " ")
        .replace(['`', '*'], "")
        .trim()
        .to_string()
}
