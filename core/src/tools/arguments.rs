//! Parsing and binding of action arguments written by the model.
//!
//! The model writes calls the way the instruction prompt shows them:
//! `add_numbers(30, 10)`, `wikipedia_summary("Chicago", sentences=3)`, or
//! with a JSON object body, `add_numbers {"x": 30, "y": 10}`. This module
//! turns the text between the parentheses into positional and keyword
//! values, then binds them to a tool's parameter names.

use crate::error::{Result, ToolError};
use serde_json::{Map, Number, Value};

/// Arguments of one action, before they are bound to parameter names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionArguments {
    /// Positional values, in call order
    pub positional: Vec<Value>,
    /// Keyword values, in call order
    pub named: Vec<(String, Value)>,
}

impl ActionArguments {
    /// Parse raw argument text
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();

        if trimmed.starts_with('{') {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
                return Ok(Self {
                    positional: Vec::new(),
                    named: map.into_iter().collect(),
                });
            }
        }

        Scanner::new(trimmed).parse_arguments().map_err(|message| {
            ToolError::MalformedArguments {
                input: input.to_string(),
                message,
            }
            .into()
        })
    }

    /// Whether no arguments were given
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    /// Bind the arguments to parameter names, producing a JSON object
    pub fn bind(self, order: &[String]) -> Result<Value> {
        if self.positional.len() > order.len() {
            return Err(ToolError::InvalidParameters {
                message: format!(
                    "takes {} argument{} but {} were given",
                    order.len(),
                    if order.len() == 1 { "" } else { "s" },
                    self.positional.len()
                ),
            }
            .into());
        }

        let mut map = Map::new();
        for (name, value) in order.iter().zip(self.positional) {
            map.insert(name.clone(), value);
        }

        for (key, value) in self.named {
            if !order.contains(&key) {
                return Err(ToolError::InvalidParameters {
                    message: format!("unexpected keyword argument '{}'", key),
                }
                .into());
            }
            if map.contains_key(&key) {
                return Err(ToolError::InvalidParameters {
                    message: format!("got multiple values for argument '{}'", key),
                }
                .into());
            }
            map.insert(key, value);
        }

        Ok(Value::Object(map))
    }
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn parse_arguments(&mut self) -> std::result::Result<ActionArguments, String> {
        let mut args = ActionArguments::default();

        loop {
            self.skip_whitespace();
            if self.peek().is_none() {
                break;
            }

            if let Some(key) = self.try_keyword() {
                if args.named.iter().any(|(k, _)| k == &key) {
                    return Err(format!("duplicate keyword argument '{}'", key));
                }
                let value = self.parse_value(&[','])?;
                args.named.push((key, value));
            } else {
                if !args.named.is_empty() {
                    return Err("positional argument follows keyword argument".to_string());
                }
                let value = self.parse_value(&[','])?;
                args.positional.push(value);
            }

            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some(',') => self.pos += 1,
                Some(c) => return Err(format!("unexpected '{}' at position {}", c, self.pos)),
            }
        }

        Ok(args)
    }

    /// Consume `name =` if present, otherwise leave the position untouched
    fn try_keyword(&mut self) -> Option<String> {
        let start = self.pos;
        let mut name = String::new();

        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }

        let starts_like_identifier = name
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_');

        if starts_like_identifier {
            self.skip_whitespace();
            let next = self.chars.get(self.pos + 1).copied();
            if self.peek() == Some('=') && next != Some('=') {
                self.pos += 1;
                return Some(name);
            }
        }

        self.pos = start;
        None
    }

    fn parse_value(&mut self, terminators: &[char]) -> std::result::Result<Value, String> {
        self.skip_whitespace();
        match self.peek() {
            None => Err("expected a value".to_string()),
            Some('"') | Some('\'') => self.parse_string().map(Value::String),
            Some('[') => self.parse_list(),
            Some('{') => self.parse_object(),
            Some(_) => self.parse_bare(terminators),
        }
    }

    fn parse_string(&mut self) -> std::result::Result<String, String> {
        let quote = self.chars[self.pos];
        self.pos += 1;
        let mut out = String::new();

        while let Some(c) = self.peek() {
            self.pos += 1;
            if c == quote {
                return Ok(out);
            }
            if c == '\\' {
                let escaped = self.peek().ok_or("unterminated escape sequence")?;
                self.pos += 1;
                out.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => other,
                });
            } else {
                out.push(c);
            }
        }

        Err("unterminated string".to_string())
    }

    fn parse_list(&mut self) -> std::result::Result<Value, String> {
        self.pos += 1;
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();
            if self.peek() == Some(']') {
                self.pos += 1;
                return Ok(Value::Array(items));
            }
            items.push(self.parse_value(&[',', ']'])?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(']') => {}
                Some(c) => return Err(format!("unexpected '{}' in list", c)),
                None => return Err("unterminated list".to_string()),
            }
        }
    }

    fn parse_object(&mut self) -> std::result::Result<Value, String> {
        self.pos += 1;
        let mut map = Map::new();

        loop {
            self.skip_whitespace();
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(Value::Object(map));
            }

            let key = match self.parse_value(&[':'])? {
                Value::String(s) => s,
                other => other.to_string(),
            };
            self.skip_whitespace();
            if self.peek() != Some(':') {
                return Err(format!("expected ':' after key '{}'", key));
            }
            self.pos += 1;

            let value = self.parse_value(&[',', '}'])?;
            map.insert(key, value);

            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some('}') => {}
                Some(c) => return Err(format!("unexpected '{}' in object", c)),
                None => return Err("unterminated object".to_string()),
            }
        }
    }

    fn parse_bare(&mut self, terminators: &[char]) -> std::result::Result<Value, String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if terminators.contains(&c) {
                break;
            }
            self.pos += 1;
        }

        let text: String = self.chars[start..self.pos].iter().collect();
        literal(text.trim())
    }
}

/// Interpret an unquoted token
fn literal(text: &str) -> std::result::Result<Value, String> {
    match text {
        "" => Err("empty argument".to_string()),
        "true" | "True" => Ok(Value::Bool(true)),
        "false" | "False" => Ok(Value::Bool(false)),
        "null" | "None" => Ok(Value::Null),
        _ => {
            let numeric = text.replace('_', "");
            if let Ok(i) = numeric.parse::<i64>() {
                return Ok(Value::Number(i.into()));
            }
            if let Ok(f) = numeric.parse::<f64>() {
                if let Some(n) = Number::from_f64(f) {
                    return Ok(Value::Number(n));
                }
            }
            Ok(Value::String(text.to_string()))
        }
    }
}
