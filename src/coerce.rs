//! Total coercions from loosely-typed match JSON into the shapes the rest of the crate reads.
//!
//! Every function here returns a value for every input. A field that is missing and a field
//! that is malformed come out the same way, so callers never branch on decode failures.

use std::borrow::Cow;

use serde_json::{Map, Value};

/// Returns `value` as a mapping. JSON-encoded strings are decoded and accepted only when they
/// decode to an object; everything else becomes an empty mapping. Native objects are borrowed.
pub fn to_mapping(value: &Value) -> Cow<'_, Map<String, Value>> {
    match value {
        Value::Object(map) => Cow::Borrowed(map),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Cow::Owned(map),
            _ => Cow::Owned(Map::new()),
        },
        _ => Cow::Owned(Map::new()),
    }
}

/// Returns `value` as a sequence, with the same string-decoding rule as [`to_mapping`].
pub fn to_sequence(value: &Value) -> Cow<'_, [Value]> {
    match value {
        Value::Array(items) => Cow::Borrowed(items.as_slice()),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(items)) => Cow::Owned(items),
            _ => Cow::Owned(Vec::new()),
        },
        _ => Cow::Owned(Vec::new()),
    }
}

pub fn field_mapping<'a>(map: &'a Map<String, Value>, key: &str) -> Cow<'a, Map<String, Value>> {
    map.get(key).map(to_mapping).unwrap_or_default()
}

pub fn field_sequence<'a>(map: &'a Map<String, Value>, key: &str) -> Cow<'a, [Value]> {
    map.get(key).map(to_sequence).unwrap_or_default()
}

/// Scalar as display text. Null, `false` and containers are treated as absent.
pub fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(true)) => "true".to_string(),
        _ => String::new(),
    }
}

pub fn field_text(map: &Map<String, Value>, key: &str) -> String {
    text(map.get(key))
}

/// The `idx`-th element of a sequence as text, empty when the sequence is too short.
pub fn first_text(items: &[Value], idx: usize) -> String {
    text(items.get(idx))
}

pub fn int_any(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().and_then(|u| i64::try_from(u).ok()))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(raw) => raw.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub fn float_any(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// A non-negative count; unparseable or negative values become zero.
pub fn count(value: Option<&Value>) -> u32 {
    value
        .and_then(int_any)
        .map(|n| n.clamp(0, i64::from(u32::MAX)) as u32)
        .unwrap_or(0)
}
