use std::cmp::Ordering;

use regex::RegexBuilder;
use serde_json::Value;

use crate::error::{CompileError, EvalError};

use super::ast::{FilterExpr, FilterOp, Operand};
use super::coerce::{to_number, to_text, type_name};
use super::eval;
use super::Compiled;

#[derive(Debug, Default)]
struct Field {
    text: String,
    quoted: bool,
}

/// Compile a predicate body such as `@.price < 10` or `@.isbn`.
///
/// Unquoted spaces separate the left operand, the operator and the right
/// operand. A single-quoted run is one literal and keeps its spaces.
pub fn compile(text: &str) -> Result<FilterExpr, CompileError> {
    let mut fields: [Field; 3] = Default::default();
    let mut stage = 0;
    let mut in_quote = false;
    for ch in text.chars() {
        match ch {
            '\'' => {
                in_quote = !in_quote;
                fields[stage].quoted = true;
            }
            ' ' if !in_quote => {
                stage += 1;
                if stage > 2 {
                    return Err(CompileError::InvalidFilter(text.to_string()));
                }
            }
            _ => fields[stage].text.push(ch),
        }
    }
    if in_quote {
        return Err(CompileError::UnterminatedQuote(text.to_string()));
    }

    let [left, op, right] = fields;
    let op = if stage == 0 {
        FilterOp::Exists
    } else {
        FilterOp::from_symbol(&op.text)
    };
    let right = match op {
        FilterOp::Exists => None,
        FilterOp::Match => Some(Operand::Regex(
            RegexBuilder::new(regex_body(&right.text)?)
                .case_insensitive(true)
                .build()
                .map_err(|e| CompileError::Regex {
                    pattern: right.text.clone(),
                    message: e.to_string(),
                })?,
        )),
        _ => Some(operand(right)?),
    };
    Ok(FilterExpr {
        left: operand(left)?,
        op,
        right,
    })
}

/// Inner pattern of a `/pattern/i` literal.
fn regex_body(rule: &str) -> Result<&str, CompileError> {
    if rule.len() <= 3 {
        return Err(CompileError::InvalidPattern(rule.to_string()));
    }
    rule.strip_prefix('/')
        .and_then(|r| r.strip_suffix("/i"))
        .ok_or_else(|| CompileError::InvalidPattern(rule.to_string()))
}

fn operand(field: Field) -> Result<Operand, CompileError> {
    if !field.quoted {
        if field.text.starts_with("@.") {
            return Ok(Operand::SelfPath(Compiled::compile(&field.text)?));
        }
        if field.text.starts_with("$.") {
            return Ok(Operand::RootPath(Compiled::compile(&field.text)?));
        }
    }
    Ok(Operand::Literal(field.text))
}

impl Operand {
    fn resolve(&self, candidate: &Value, root: &Value) -> Result<Value, EvalError> {
        match self {
            Operand::Literal(text) => Ok(Value::String(text.clone())),
            Operand::Regex(re) => Ok(Value::String(re.as_str().to_string())),
            Operand::SelfPath(path) => eval::evaluate(path.steps(), candidate, root),
            Operand::RootPath(path) => eval::evaluate(path.steps(), root, root),
        }
    }
}

impl FilterExpr {
    /// Test one candidate element. `root` is the document being queried.
    pub fn matches(&self, candidate: &Value, root: &Value) -> Result<bool, EvalError> {
        let left = self.left.resolve(candidate, root)?;
        match (&self.op, &self.right) {
            (FilterOp::Exists, _) => Ok(!left.is_null()),
            (FilterOp::Unsupported(symbol), _) => {
                Err(EvalError::UnsupportedOperator(symbol.clone()))
            }
            (FilterOp::Match, Some(Operand::Regex(re))) => match &left {
                Value::String(s) => Ok(re.is_match(s)),
                other => Err(EvalError::RegexOperand(type_name(other))),
            },
            (op, Some(right)) => {
                let right = right.resolve(candidate, root)?;
                Ok(compare(op, &left, &right))
            }
            (op, None) => Err(EvalError::UnsupportedOperator(format!("{op:?}"))),
        }
    }
}

/// Numeric comparison when both sides convert, lexicographic otherwise.
fn compare(op: &FilterOp, left: &Value, right: &Value) -> bool {
    let ordering = match (to_number(left), to_number(right)) {
        (Some(l), Some(r)) => l.partial_cmp(&r),
        _ => Some(to_text(left).cmp(&to_text(right))),
    };
    let Some(ordering) = ordering else {
        return false;
    };
    match op {
        FilterOp::Lt => ordering == Ordering::Less,
        FilterOp::Le => ordering != Ordering::Greater,
        FilterOp::Eq => ordering == Ordering::Equal,
        FilterOp::Ge => ordering != Ordering::Less,
        FilterOp::Gt => ordering == Ordering::Greater,
        _ => false,
    }
}
