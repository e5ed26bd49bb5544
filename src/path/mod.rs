//! Path expressions over JSON-like documents.
//!
//! A path such as `$.store.book[0:1].title` or `$..book[?(@.price < 10)]`
//! is compiled once into a [`Compiled`] plan, which can then be looked up
//! against, or used to overwrite matches in, any number of documents.

pub mod ast;
pub mod coerce;
pub mod context;
pub mod eval;
pub mod filter;
pub mod lexer;
pub mod parser;
pub mod replace;

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use crate::error::{CompileError, EvalError, JpqError};

use self::ast::Step;
use self::context::{Context, Node};

/// An immutable, reusable plan for one path expression.
///
/// Plans carry no per-call state, so one plan may serve concurrent
/// lookups and replaces against different documents.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    path: String,
    steps: Vec<Step>,
}

impl Compiled {
    pub fn compile(path: &str) -> Result<Self, CompileError> {
        let tokens = lexer::tokenize(path)?;
        let mut steps = Vec::with_capacity(tokens.len());
        let mut rest = tokens[1..].iter();
        while let Some(token) = rest.next() {
            let step = if token == lexer::DESCEND {
                // the lexer rejects a trailing `..`, so a bound token always follows
                let target = rest
                    .next()
                    .ok_or_else(|| CompileError::TrailingDot(path.to_string()))?;
                Step::Descend(Box::new(parser::parse_token(target)?))
            } else {
                parser::parse_token(token)?
            };
            steps.push(step);
        }
        if steps.is_empty() {
            return Err(CompileError::EmptyPath(path.to_string()));
        }
        debug!(path, steps = steps.len(), "compiled path");
        Ok(Compiled {
            path: path.to_string(),
            steps,
        })
    }

    /// Compile a path known to be valid.
    ///
    /// # Panics
    ///
    /// Panics if `path` does not compile.
    pub fn must_compile(path: &str) -> Self {
        Compiled::compile(path).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Evaluate against `document`.
    ///
    /// A single match comes back as itself; multi-result steps produce an
    /// array. A missing key is `null`, not an error.
    pub fn lookup(&self, document: &Value) -> Result<Value, EvalError> {
        eval::evaluate(&self.steps, document, document)
    }

    /// Overwrite every slot the final step matches with `literal`.
    ///
    /// The document is only modified once the whole walk has succeeded.
    pub fn replace(&self, document: &mut Value, literal: &Value) -> Result<(), EvalError> {
        if document.is_null() {
            return Err(EvalError::NullDocument);
        }
        if literal.is_null() {
            return Err(EvalError::NullReplacement);
        }
        let slots = {
            let ctx = Context::replacing(document);
            eval::walk(&ctx, &self.steps, Node::root(document), 0)?;
            ctx.into_writes()
        };
        let written = replace::overwrite(document, slots, literal);
        debug!(path = %self.path, written, "replaced matches");
        Ok(())
    }
}

impl fmt::Display for Compiled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Compiled lookup: {}", self.path)
    }
}

impl FromStr for Compiled {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Compiled::compile(s)
    }
}

/// Compile path text into a reusable plan.
pub fn compile(path: &str) -> Result<Compiled, CompileError> {
    Compiled::compile(path)
}

/// Compile `path` and evaluate it against `document`.
pub fn lookup(document: &Value, path: &str) -> Result<Value, JpqError> {
    Ok(Compiled::compile(path)?.lookup(document)?)
}

/// Compile `path` and overwrite its matches in `document` with `literal`.
pub fn replace(document: &mut Value, path: &str, literal: &Value) -> Result<(), JpqError> {
    Compiled::compile(path)?.replace(document, literal)?;
    Ok(())
}

/// Decode JSON bytes, then [`lookup`].
pub fn lookup_raw(json: &[u8], path: &str) -> Result<Value, JpqError> {
    let document = crate::parser::json::parse_slice(json)?;
    lookup(&document, path)
}

/// Decode JSON bytes, [`replace`], and return the modified document.
pub fn replace_raw(json: &[u8], path: &str, literal: &Value) -> Result<Value, JpqError> {
    let mut document = crate::parser::json::parse_slice(json)?;
    replace(&mut document, path, literal)?;
    Ok(document)
}
