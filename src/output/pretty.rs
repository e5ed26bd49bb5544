use serde_json::Value;

use crate::error::JpqError;
use crate::format::Format;

use super::color;

/// Rendering switches taken from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct Style {
    pub compact: bool,
    /// Print string results without quotes.
    pub raw: bool,
    /// ANSI colours for JSON output.
    pub color: bool,
}

/// Render a value in the given format, newline terminated.
pub fn format_value(value: &Value, format: Format, style: Style) -> Result<String, JpqError> {
    if style.raw {
        if let Value::String(s) = value {
            return Ok(format!("{s}\n"));
        }
    }

    let mut out = match format {
        Format::Json if style.color => color::colorize_json(value, style.compact)?,
        Format::Json if style.compact => {
            serde_json::to_string(value).map_err(|e| JpqError::Parse(e.to_string()))?
        }
        Format::Json => {
            serde_json::to_string_pretty(value).map_err(|e| JpqError::Parse(e.to_string()))?
        }
        Format::Yaml => {
            return serde_yaml::to_string(value).map_err(|e| JpqError::Parse(e.to_string()))
        }
    };
    out.push('\n');
    Ok(out)
}
