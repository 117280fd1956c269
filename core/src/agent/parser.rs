//! Tolerant decomposition of model output into a reasoning step.
//!
//! The model is asked to write labeled lines (`Thought1:`, `Action1:`,
//! `Answer:`). Labels are recognised at the start of a line regardless of
//! case, iteration number, a `Final` prefix or surrounding `**` emphasis. An
//! answer label in the middle of a line still ends the run when nothing
//! else in the response is actionable. Text from the first
//! `Observation` label onwards is discarded since observations are only ever
//! supplied by the loop.

use regex::Regex;
use std::sync::LazyLock;

/// What a single model response asks the loop to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedStep {
    /// Reasoning only, no action and no answer
    Reasoning { reasoning: String },

    /// Reasoning followed by one tool call
    ReasoningWithAction {
        reasoning: String,
        name: String,
        arguments: String,
    },

    /// Reasoning followed by the final answer
    ReasoningWithAnswer { reasoning: String, answer: String },
}

impl ParsedStep {
    pub fn reasoning(&self) -> &str {
        match self {
            ParsedStep::Reasoning { reasoning }
            | ParsedStep::ReasoningWithAction { reasoning, .. }
            | ParsedStep::ReasoningWithAnswer { reasoning, .. } => reasoning,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Thought,
    Action,
    Observation,
    Answer,
}

struct Section<'a> {
    label: Label,
    /// Byte offset where the label starts
    start: usize,
    body: &'a str,
}

static LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:\*\*)?[ \t]*(?:final[ \t]+)?(thought|action|observation|answer)[ \t]*\d*[ \t]*(?:\*\*)?[ \t]*:(?:\*\*)?[ \t]*",
    )
    .expect("Invalid label regex")
});

/// An answer label anywhere in a line, used when no labeled line answers
static INLINE_ANSWER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\*\*)?\b(?:final[ \t]+)?answer[ \t]*\d*[ \t]*(?:\*\*)?[ \t]*:(?:\*\*)?[ \t]*")
        .expect("Invalid inline answer regex")
});

static CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^([A-Za-z_][A-Za-z0-9_.]*)[ \t]*(?:\((.*)\)|(\{.*\}))?$")
        .expect("Invalid call regex")
});

fn sections(text: &str) -> Vec<Section<'_>> {
    let matches: Vec<_> = LABEL.captures_iter(text).collect();
    let mut sections = Vec::with_capacity(matches.len());

    for (i, caps) in matches.iter().enumerate() {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let label = match name.as_str().to_ascii_lowercase().as_str() {
            "thought" => Label::Thought,
            "action" => Label::Action,
            "observation" => Label::Observation,
            _ => Label::Answer,
        };
        let end = matches
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |m| m.start());

        sections.push(Section {
            label,
            start: whole.start(),
            body: &text[whole.end()..end],
        });
    }

    sections
}

/// Drop surrounding backticks and sentence punctuation after a call
fn strip_call(text: &str) -> &str {
    text.trim()
        .trim_end_matches(['.', ';'])
        .trim_matches('`')
        .trim()
}

/// Split an action body into a tool name and its raw arguments
fn parse_call(body: &str) -> Option<(String, String)> {
    let cleaned = strip_call(body);
    let first_line = strip_call(cleaned.lines().next().unwrap_or_default());

    [cleaned, first_line]
        .into_iter()
        .filter(|candidate| !candidate.is_empty())
        .find_map(|candidate| {
            let caps = CALL.captures(candidate)?;
            let name = caps.get(1)?.as_str().to_string();
            let arguments = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map_or(String::new(), |m| m.as_str().trim().to_string());
            Some((name, arguments))
        })
}

/// Parse a raw model response. Never fails: anything unrecognised is
/// treated as reasoning.
pub fn parse_response(text: &str) -> ParsedStep {
    let all = sections(text);

    let cutoff = all
        .iter()
        .find(|s| s.label == Label::Observation)
        .map_or(text.len(), |s| s.start);
    let sections: Vec<&Section> = all.iter().filter(|s| s.start < cutoff).collect();
    let visible = &text[..cutoff];

    let thoughts: Vec<&str> = sections
        .iter()
        .filter(|s| s.label == Label::Thought)
        .map(|s| s.body.trim())
        .filter(|b| !b.is_empty())
        .collect();

    let reasoning_before = |start: usize| -> String {
        if !thoughts.is_empty() {
            return thoughts.join("\n");
        }
        let preceding = visible[..start].trim();
        if preceding.is_empty() {
            visible.trim().to_string()
        } else {
            preceding.to_string()
        }
    };

    if let Some(answer) = sections
        .iter()
        .filter(|s| s.label == Label::Answer)
        .find(|s| !s.body.trim().is_empty())
    {
        return ParsedStep::ReasoningWithAnswer {
            reasoning: reasoning_before(answer.start),
            answer: answer.body.trim().to_string(),
        };
    }

    if let Some((action, (name, arguments))) = sections
        .iter()
        .filter(|s| s.label == Label::Action)
        .find_map(|s| parse_call(s.body).map(|call| (s, call)))
    {
        return ParsedStep::ReasoningWithAction {
            reasoning: reasoning_before(action.start),
            name,
            arguments,
        };
    }

    if let Some((label, answer)) = INLINE_ANSWER
        .find_iter(visible)
        .map(|m| (m, visible[m.end()..].trim()))
        .find(|(_, answer)| !answer.is_empty())
    {
        let preceding = LABEL.replace_all(&visible[..label.start()], "");
        let preceding = preceding.trim();
        return ParsedStep::ReasoningWithAnswer {
            reasoning: if preceding.is_empty() {
                visible.trim().to_string()
            } else {
                preceding.to_string()
            },
            answer: answer.to_string(),
        };
    }

    let reasoning = if thoughts.is_empty() {
        visible.trim().to_string()
    } else {
        thoughts.join("\n")
    };
    ParsedStep::Reasoning { reasoning }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(text: &str) -> (String, String, String) {
        match parse_response(text) {
            ParsedStep::ReasoningWithAction {
                reasoning,
                name,
                arguments,
            } => (reasoning, name, arguments),
            other => panic!("expected an action, got {:?}", other),
        }
    }

    #[test]
    fn test_thought_and_action() {
        let (reasoning, name, arguments) =
            action("Thought1: I need to multiply 10 by 3.\nAction1: multiply_numbers(10, 3)");
        assert_eq!(reasoning, "I need to multiply 10 by 3.");
        assert_eq!(name, "multiply_numbers");
        assert_eq!(arguments, "10, 3");
    }

    #[test]
    fn test_answer_wins_and_spans_lines() {
        let parsed = parse_response(
            "Thought3: I have everything.\nAnswer: It is 40.\n1. multiplied\n2. added",
        );
        assert_eq!(
            parsed,
            ParsedStep::ReasoningWithAnswer {
                reasoning: "I have everything.".to_string(),
                answer: "It is 40.\n1. multiplied\n2. added".to_string(),
            }
        );
    }

    #[test]
    fn test_labels_are_case_and_markdown_tolerant() {
        let (_, name, arguments) =
            action("**thought 2:** adding now\n**ACTION2**: `add_numbers(30, 10)`");
        assert_eq!(name, "add_numbers");
        assert_eq!(arguments, "30, 10");

        let parsed = parse_response("**Answer:** 42");
        assert!(matches!(parsed, ParsedStep::ReasoningWithAnswer { ref answer, .. } if answer == "42"));
    }

    #[test]
    fn test_invented_observations_are_ignored() {
        let (_, name, _) = action(
            "Thought1: add\nAction1: add_numbers(1, 2)\nObservation1: 3\nAnswer: 3",
        );
        assert_eq!(name, "add_numbers");
    }

    #[test]
    fn test_json_body_and_bare_name() {
        let (_, name, arguments) = action(r#"Action: add_numbers {"x": 1, "y": 2}"#);
        assert_eq!(name, "add_numbers");
        assert_eq!(arguments, r#"{"x": 1, "y": 2}"#);

        let (_, name, arguments) = action("Action1: frobnicate");
        assert_eq!(name, "frobnicate");
        assert_eq!(arguments, "");
    }

    #[test]
    fn test_action_with_trailing_lines() {
        let (_, name, arguments) =
            action("Thought1: look it up\nAction1: wikipedia_summary(\"Chicago\", 3)\nPAUSE");
        assert_eq!(name, "wikipedia_summary");
        assert_eq!(arguments, "\"Chicago\", 3");
    }

    #[test]
    fn test_reasoning_without_labels() {
        assert_eq!(
            parse_response("  I am not sure what to do.  "),
            ParsedStep::Reasoning {
                reasoning: "I am not sure what to do.".to_string()
            }
        );
    }

    #[test]
    fn test_unparseable_action_is_reasoning() {
        let parsed = parse_response("Thought1: hmm\nAction1: I will add the numbers next");
        assert_eq!(
            parsed,
            ParsedStep::Reasoning {
                reasoning: "hmm".to_string()
            }
        );
    }

    #[test]
    fn test_empty_answer_falls_through() {
        let (_, name, _) = action("Answer:\nAction1: add_numbers(1, 2)");
        assert_eq!(name, "add_numbers");
    }

    #[test]
    fn test_answer_word_inside_thought_is_not_a_label() {
        let (_, name, _) = action("Thought1: The Answer: is not known yet\nAction1: add_numbers(1, 2)");
        assert_eq!(name, "add_numbers");
    }

    #[test]
    fn test_reasoning_falls_back_to_preceding_text() {
        let parsed = parse_response("Let me compute this.\nAction: add_numbers(1, 2)");
        assert_eq!(parsed.reasoning(), "Let me compute this.");
    }

    #[test]
    fn test_final_answer_forms() {
        let parsed = parse_response("Thought3: I have it.\nFinal Answer: 40");
        assert_eq!(
            parsed,
            ParsedStep::ReasoningWithAnswer {
                reasoning: "I have it.".to_string(),
                answer: "40".to_string(),
            }
        );

        let parsed = parse_response("**Final Answer:** 42");
        assert!(matches!(parsed, ParsedStep::ReasoningWithAnswer { ref answer, .. } if answer == "42"));
    }

    #[test]
    fn test_inline_answer_is_recognised() {
        let parsed = parse_response("Thought3: Adding them gives the total. Answer: 40");
        assert_eq!(
            parsed,
            ParsedStep::ReasoningWithAnswer {
                reasoning: "Adding them gives the total.".to_string(),
                answer: "40".to_string(),
            }
        );
    }

    #[test]
    fn test_trailing_punctuation_after_call() {
        let (_, name, arguments) = action("Thought1: add\nAction1: add_numbers(1, 2).");
        assert_eq!(name, "add_numbers");
        assert_eq!(arguments, "1, 2");

        let (_, name, arguments) = action("Action1: `multiply_numbers(2, 3)`;");
        assert_eq!(name, "multiply_numbers");
        assert_eq!(arguments, "2, 3");
    }
}
