use serde_json::{Map, Number, Value};
use serde_yaml::Value as Yaml;

use crate::error::JpqError;

/// Decode a YAML string into a serde_json::Value.
///
/// Paths are evaluated over serde_json values only, so YAML documents are
/// converted on the way in. Tags are dropped; mapping keys must be scalars.
pub fn parse(input: &str) -> Result<Value, JpqError> {
    let yaml: Yaml = serde_yaml::from_str(input).map_err(|e| JpqError::Parse(e.to_string()))?;
    to_json(yaml)
}

fn to_json(yaml: Yaml) -> Result<Value, JpqError> {
    Ok(match yaml {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => number(&n),
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(seq) => {
            Value::Array(seq.into_iter().map(to_json).collect::<Result<_, _>>()?)
        }
        Yaml::Mapping(mapping) => {
            let mut obj = Map::with_capacity(mapping.len());
            for (k, v) in mapping {
                obj.insert(key(k)?, to_json(v)?);
            }
            Value::Object(obj)
        }
        Yaml::Tagged(tagged) => to_json(tagged.value)?,
    })
}

fn number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        Value::Number(u.into())
    } else {
        // NaN and infinities have no JSON form
        n.as_f64()
            .and_then(Number::from_f64)
            .map_or(Value::Null, Value::Number)
    }
}

fn key(k: Yaml) -> Result<String, JpqError> {
    match k {
        Yaml::String(s) => Ok(s),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        _ => Err(JpqError::Parse("unsupported YAML map key type".into())),
    }
}
