use regex::Regex;

use super::Compiled;

/// One compiled unit of a path, applied in sequence during evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// `$` or `@` in a non-leading position: identity.
    Root,
    /// Object member access: `.name`
    Key(String),
    /// Array element(s): `[0]`, `[-1]`, `list[1,3]`
    Index {
        key: Option<String>,
        indices: Vec<i64>,
    },
    /// Slice with inclusive `to`: `[1:3]`, `[-2:]`, `[*]`
    Range {
        key: Option<String>,
        from: Option<i64>,
        to: Option<i64>,
    },
    /// All member values or elements, nulls dropped: `.*`
    Wildcard,
    /// Recursive descent (`..`): the bound step applied at every level.
    Descend(Box<Step>),
    /// Elements satisfying a predicate: `[?(@.price < 10)]`
    Filter {
        key: Option<String>,
        predicate: Box<FilterExpr>,
    },
}

impl Step {
    /// Steps that can only ever yield one value.
    pub fn single_result(&self) -> bool {
        match self {
            Step::Key(_) => true,
            Step::Index { indices, .. } => indices.len() == 1,
            _ => false,
        }
    }
}

/// A predicate of the form `<left> [<op> <right>]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpr {
    pub left: Operand,
    pub op: FilterOp,
    /// Absent only for `exists`.
    pub right: Option<Operand>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOp {
    Exists,
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
    Match,
    /// Kept verbatim; rejected when the predicate is evaluated.
    Unsupported(String),
}

impl FilterOp {
    pub fn from_symbol(symbol: &str) -> Self {
        match symbol {
            "exists" => FilterOp::Exists,
            "<" => FilterOp::Lt,
            "<=" => FilterOp::Le,
            "==" => FilterOp::Eq,
            ">=" => FilterOp::Ge,
            ">" => FilterOp::Gt,
            "=~" => FilterOp::Match,
            other => FilterOp::Unsupported(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Operand {
    Literal(String),
    /// Right side of `=~`, compiled case-insensitive.
    Regex(Regex),
    /// `@.…`, evaluated against the candidate element.
    SelfPath(Compiled),
    /// `$.…`, evaluated against the document root.
    RootPath(Compiled),
}

impl PartialEq for Operand {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Operand::Literal(a), Operand::Literal(b)) => a == b,
            (Operand::Regex(a), Operand::Regex(b)) => a.as_str() == b.as_str(),
            (Operand::SelfPath(a), Operand::SelfPath(b)) => a == b,
            (Operand::RootPath(a), Operand::RootPath(b)) => a == b,
            _ => false,
        }
    }
}
