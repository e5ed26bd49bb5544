use serde_json::Value;

use crate::error::JpqError;

/// Decode a JSON string into a serde_json::Value.
pub fn parse(input: &str) -> Result<Value, JpqError> {
    serde_json::from_str(input).map_err(|e| JpqError::Parse(e.to_string()))
}

/// Decode raw JSON bytes.
pub fn parse_slice(input: &[u8]) -> Result<Value, JpqError> {
    serde_json::from_slice(input).map_err(|e| JpqError::Parse(e.to_string()))
}
