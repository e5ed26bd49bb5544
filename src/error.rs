use thiserror::Error;

/// Failure while turning path text into a compiled plan.
///
/// Compile errors are raised before any document is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("path must start with '$' or '@': {0:?}")]
    MissingRoot(String),

    #[error("path must not end with '.': {0:?}")]
    TrailingDot(String),

    #[error("unbalanced brackets in {0:?}")]
    UnbalancedBracket(String),

    #[error("regex literal has no closing '/i' in {0:?}")]
    UnterminatedRegex(String),

    #[error("unterminated quote in filter {0:?}")]
    UnterminatedQuote(String),

    #[error("path {0:?} has no steps")]
    EmptyPath(String),

    #[error("bracket expression too short: {0:?}")]
    BracketTooShort(String),

    #[error("bracket expression not closed: {0:?}")]
    UnclosedBracket(String),

    #[error("invalid filter {0:?}")]
    InvalidFilter(String),

    #[error("only one range (from:to) is supported: {0:?}")]
    InvalidRange(String),

    #[error("index is not an integer: {0:?}")]
    InvalidIndex(String),

    #[error("regex operand must look like /pattern/i: {0:?}")]
    InvalidPattern(String),

    #[error("regex {pattern:?} does not compile: {message}")]
    Regex { pattern: String, message: String },
}

/// Failure while applying a compiled plan to a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("index out of range: {index} (length {length})")]
    IndexOutOfRange { index: i64, length: usize },

    #[error("range {bound} out of range: {value} (length {length})")]
    RangeOutOfBounds {
        bound: &'static str,
        value: i64,
        length: usize,
    },

    #[error("range applied to {0}, expected array")]
    RangeOnNonArray(&'static str),

    #[error("regex can only match a string, found {0}")]
    RegexOperand(&'static str),

    #[error("unsupported filter operator {0:?} (expected <, <=, ==, >=, >, =~)")]
    UnsupportedOperator(String),

    #[error("cannot replace inside a null document")]
    NullDocument,

    #[error("replacement value must not be null")]
    NullReplacement,

    #[error("document nested deeper than {0} levels")]
    DepthExceeded(usize),
}

#[derive(Error, Debug)]
pub enum JpqError {
    #[error("invalid path: {0}")]
    Compile(#[from] CompileError),

    #[error("evaluation failed: {0}")]
    Eval(#[from] EvalError),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("cannot detect format: no file extension")]
    NoExtension,

    #[error("unknown file extension: .{0}")]
    UnknownExtension(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
