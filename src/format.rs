use std::path::Path;

use serde_json::Value;

use crate::error::JpqError;
use crate::parser::{json, yaml};

/// Document encodings accepted on input and produced on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Detect format from a file extension.
    pub fn from_extension(path: &Path) -> Result<Self, JpqError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or(JpqError::NoExtension)?;
        Format::named(ext).ok_or_else(|| JpqError::UnknownExtension(ext.to_string()))
    }

    /// Parse a format name from CLI flags.
    pub fn from_str_name(s: &str) -> Result<Self, JpqError> {
        Format::named(s).ok_or_else(|| JpqError::UnsupportedFormat(s.to_string()))
    }

    /// Guess from content when there is no file name to go by.
    pub fn sniff(input: &str) -> Self {
        match input.trim_start().chars().next() {
            Some('{' | '[') => Format::Json,
            _ => Format::Yaml,
        }
    }

    /// Decode `input` into the document model paths evaluate against.
    pub fn decode(self, input: &str) -> Result<Value, JpqError> {
        match self {
            Format::Json => json::parse(input),
            Format::Yaml => yaml::parse(input),
        }
    }

    fn named(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Json => write!(f, "json"),
            Format::Yaml => write!(f, "yaml"),
        }
    }
}
