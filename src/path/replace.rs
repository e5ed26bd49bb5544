use serde_json::Value;

use super::context::{Location, Slot};

/// Overwrite every recorded slot with a clone of `literal`.
///
/// Deeper locations are written first so that when one slot lies inside
/// another, the outer write is the one that survives. Returns the number
/// of slots written.
pub fn overwrite(document: &mut Value, mut slots: Vec<Location>, literal: &Value) -> usize {
    slots.sort_by(|a, b| b.len().cmp(&a.len()));
    let mut written = 0;
    for location in &slots {
        if let Some(target) = locate(document, location) {
            *target = literal.clone();
            written += 1;
        }
    }
    written
}

fn locate<'v>(mut value: &'v mut Value, location: &[Slot]) -> Option<&'v mut Value> {
    for slot in location {
        value = match (value, slot) {
            (Value::Object(map), Slot::Key(key)) => map.get_mut(key)?,
            (Value::Array(items), Slot::Index(i)) => items.get_mut(*i)?,
            _ => return None,
        };
    }
    Some(value)
}
