//! Builtin tools shipped with the agent.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Tool;

/// Every builtin tool, in catalog order.
pub fn all() -> Vec<Arc<dyn Tool>> {
    vec![Arc::new(Evaluate), Arc::new(WordCount)]
}

/// Evaluate an arithmetic expression (+, -, *, /, parentheses).
pub struct Evaluate;

#[async_trait]
impl Tool for Evaluate {
    fn name(&self) -> &str {
        "evaluate"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression with +, -, *, / and parentheses. Args: {\"expression\": \"(2+3)*4\"}"
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let expression = args["expression"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'expression' argument"))?;

        let value = eval_expression(expression)?;
        Ok(json!({ "result": value }))
    }
}

/// Count words and characters in a text.
pub struct WordCount;

#[async_trait]
impl Tool for WordCount {
    fn name(&self) -> &str {
        "word_count"
    }

    fn description(&self) -> &str {
        "Count words and characters in a text. Args: {\"text\": \"some text\"}"
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let text = args["text"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'text' argument"))?;

        Ok(json!({
            "result": format!(
                "{} words, {} characters",
                text.split_whitespace().count(),
                text.chars().count()
            )
        }))
    }
}

/// Recursive-descent evaluator for `+ - * /` with parentheses and unary minus.
fn eval_expression(input: &str) -> anyhow::Result<f64> {
    let tokens: Vec<char> = input.chars().filter(|c| !c.is_whitespace()).collect();
    let mut pos = 0;
    let value = parse_sum(&tokens, &mut pos)?;
    if pos != tokens.len() {
        anyhow::bail!("Unexpected character at position {}", pos);
    }
    Ok(value)
}

fn parse_sum(tokens: &[char], pos: &mut usize) -> anyhow::Result<f64> {
    let mut value = parse_product(tokens, pos)?;
    while let Some(&op) = tokens.get(*pos) {
        match op {
            '+' => {
                *pos += 1;
                value += parse_product(tokens, pos)?;
            }
            '-' => {
                *pos += 1;
                value -= parse_product(tokens, pos)?;
            }
            _ => break,
        }
    }
    Ok(value)
}

fn parse_product(tokens: &[char], pos: &mut usize) -> anyhow::Result<f64> {
    let mut value = parse_atom(tokens, pos)?;
    while let Some(&op) = tokens.get(*pos) {
        match op {
            '*' => {
                *pos += 1;
                value *= parse_atom(tokens, pos)?;
            }
            '/' => {
                *pos += 1;
                let divisor = parse_atom(tokens, pos)?;
                if divisor == 0.0 {
                    anyhow::bail!("Division by zero");
                }
                value /= divisor;
            }
            _ => break,
        }
    }
    Ok(value)
}

fn parse_atom(tokens: &[char], pos: &mut usize) -> anyhow::Result<f64> {
    match tokens.get(*pos) {
        Some('-') => {
            *pos += 1;
            Ok(-parse_atom(tokens, pos)?)
        }
        Some('(') => {
            *pos += 1;
            let value = parse_sum(tokens, pos)?;
            if tokens.get(*pos) != Some(&')') {
                anyhow::bail!("Unbalanced parentheses");
            }
            *pos += 1;
            Ok(value)
        }
        Some(c) if c.is_ascii_digit() || *c == '.' => {
            let start = *pos;
            while tokens
                .get(*pos)
                .is_some_and(|c| c.is_ascii_digit() || *c == '.')
            {
                *pos += 1;
            }
            let literal: String = tokens[start..*pos].iter().collect();
            literal
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid number: {}", literal))
        }
        other => anyhow::bail!("Unexpected token: {:?}", other),
    }
}
