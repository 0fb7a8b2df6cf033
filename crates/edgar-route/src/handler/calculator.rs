//! Arithmetic handler.
//!
//! Understands a single binary operation written with a symbol
//! (`12 * 4`) or a word (`12 times 4`). "plus" sums every number found.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::error::RouteError;
use crate::handler::RouteHandler;
use crate::types::HandlerReply;

static EXPRESSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*([+\-*/])\s*(\d+)").expect("Invalid expression regex")
});

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("Invalid number regex"));

static PLUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(plus|add)\b").expect("Invalid operator regex"));
static MINUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(minus|subtract)\b").expect("Invalid operator regex"));
static TIMES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(times|multiplied|x)\b").expect("Invalid operator regex"));
static DIVIDED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(divided|over)\b").expect("Invalid operator regex"));

const DIVIDE_BY_ZERO: &str = "I can't divide by zero!";
const USAGE: &str =
    "I can help with basic math! Try asking something like 'what is 5 + 3' or 'calculate 10 times 2'.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    fn symbol(self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "×",
            Op::Div => "÷",
        }
    }
}

/// Handler for simple arithmetic questions.
pub struct CalculatorHandler;

impl CalculatorHandler {
    /// Evaluate `input`, returning the reply text and whether it was a result.
    pub fn evaluate(input: &str) -> Result<(String, bool), RouteError> {
        if input.trim().is_empty() {
            return Err(RouteError::InvalidInput(
                "Calculation must not be empty".to_string(),
            ));
        }

        if let Some(caps) = EXPRESSION_RE.captures(input) {
            let op = match &caps[2] {
                "+" => Op::Add,
                "-" => Op::Sub,
                "*" => Op::Mul,
                _ => Op::Div,
            };
            let lhs = parse_operand(&caps[1])?;
            let rhs = parse_operand(&caps[3])?;
            return apply(op, &[lhs, rhs]).map(|text| (text, true));
        }

        let numbers = NUMBER_RE
            .find_iter(input)
            .map(|m| parse_operand(m.as_str()))
            .collect::<Result<Vec<i64>, RouteError>>()?;
        if numbers.len() < 2 {
            return Ok((USAGE.to_string(), false));
        }

        let op = if PLUS_RE.is_match(input) {
            Op::Add
        } else if MINUS_RE.is_match(input) {
            Op::Sub
        } else if TIMES_RE.is_match(input) {
            Op::Mul
        } else if DIVIDED_RE.is_match(input) {
            Op::Div
        } else {
            return Ok((USAGE.to_string(), false));
        };

        let operands = if op == Op::Add {
            &numbers[..]
        } else {
            &numbers[..2]
        };
        apply(op, operands).map(|text| (text, true))
    }
}

fn parse_operand(raw: &str) -> Result<i64, RouteError> {
    raw.parse::<i64>()
        .map_err(|e| RouteError::HandlerFailed(format!("cannot read number {}: {}", raw, e)))
}

fn apply(op: Op, operands: &[i64]) -> Result<String, RouteError> {
    let overflow = || RouteError::HandlerFailed("result is too large".to_string());
    let shown = operands
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(&format!(" {} ", op.symbol()));

    let (lhs, rhs) = (operands[0], operands[1]);
    let result = match op {
        Op::Add => operands
            .iter()
            .try_fold(0i64, |acc, n| acc.checked_add(*n))
            .ok_or_else(overflow)?
            .to_string(),
        Op::Sub => lhs.checked_sub(rhs).ok_or_else(overflow)?.to_string(),
        Op::Mul => lhs.checked_mul(rhs).ok_or_else(overflow)?.to_string(),
        Op::Div => {
            if rhs == 0 {
                return Ok(DIVIDE_BY_ZERO.to_string());
            }
            if lhs % rhs == 0 {
                (lhs / rhs).to_string()
            } else {
                format!("{:.2}", lhs as f64 / rhs as f64)
            }
        }
    };
    Ok(format!("{} = {}", shown, result))
}

#[async_trait]
impl RouteHandler for CalculatorHandler {
    fn name(&self) -> &str {
        "calculator"
    }

    fn describe(&self) -> &str {
        "Basic arithmetic on two numbers"
    }

    async fn invoke(&self, input: &str) -> Result<Vec<HandlerReply>, RouteError> {
        let (text, computed) = Self::evaluate(input)?;
        tracing::info!(computed, "Calculator answered");
        let confidence = if computed { 1.0 } else { 0.5 };
        Ok(vec![HandlerReply::new(text, confidence, self.name())])
    }
}
