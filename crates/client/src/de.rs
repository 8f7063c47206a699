//! Deserialisation helpers for loosely typed payload fields
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub(crate) fn yes() -> bool {
    true
}

/// Accepts `"7"`, `7`, `null` or a missing field
pub(crate) fn opt_string_or_number<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Accepts a single string, a list of strings, or nothing
pub(crate) fn string_list<'de, D>(d: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) if !s.is_empty() => vec![s],
        Some(Value::Array(vs)) => vs
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => vec![],
    })
}

/// Accepts a count, or a list whose length is the count
pub(crate) fn count_or_list<'de, D>(d: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::Array(vs)) => Some(vs.len() as u64),
        _ => None,
    })
}
