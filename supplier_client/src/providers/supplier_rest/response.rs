//! Locating the record array inside a supplier response.
//!
//! The supplier has shipped several envelope formats over time. Rather than
//! branching ad hoc, each known layout is a [`ShapeStrategy`]; strategies are
//! tried in order and the first one that matches wins. When none match, the
//! payload's own diagnostic fields (`message`, `error`, `status`) are surfaced
//! in the resulting [`FetchError::Shape`].

use serde_json::Value;

use crate::{errors::FetchError, models::raw_record::RawRecord};

/// One way a record array may be laid out in a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeStrategy {
    /// The payload itself is the array.
    TopLevelArray,
    /// The array lives under this top-level key (matched case-insensitively).
    KeyedArray(&'static str),
    /// The payload is one bare record, recognized by its stock identifier.
    SingleRecord,
}

/// Strategies tried by [`extract_records`], in order.
pub const DEFAULT_STRATEGIES: &[ShapeStrategy] = &[
    ShapeStrategy::TopLevelArray,
    ShapeStrategy::KeyedArray("data"),
    ShapeStrategy::KeyedArray("diamonds"),
    ShapeStrategy::KeyedArray("results"),
    ShapeStrategy::KeyedArray("items"),
    ShapeStrategy::KeyedArray("records"),
    ShapeStrategy::KeyedArray("content"),
    ShapeStrategy::SingleRecord,
];

/// Top-level fields that carry a human-readable explanation from the supplier.
const DIAGNOSTIC_KEYS: &[&str] = &["message", "error", "status"];

impl ShapeStrategy {
    /// Moves the record array out of `payload` if this strategy matches.
    fn take(&self, payload: &mut Value) -> Option<Vec<Value>> {
        match self {
            ShapeStrategy::TopLevelArray => match payload {
                Value::Array(items) => Some(std::mem::take(items)),
                _ => None,
            },
            ShapeStrategy::KeyedArray(name) => {
                let obj = payload.as_object_mut()?;
                let key = obj.keys().find(|k| k.eq_ignore_ascii_case(name))?.clone();
                match obj.get_mut(&key)? {
                    Value::Array(items) => Some(std::mem::take(items)),
                    _ => None,
                }
            }
            ShapeStrategy::SingleRecord => {
                let obj = payload.as_object()?;
                let rec = RawRecord::from_map(obj.clone());
                rec.identifier()?;
                Some(vec![payload.take()])
            }
        }
    }
}

/// Extracts the records of `payload` using [`DEFAULT_STRATEGIES`].
pub fn extract_records(payload: Value) -> Result<Vec<RawRecord>, FetchError> {
    extract_records_with(payload, DEFAULT_STRATEGIES)
}

/// Extracts the records of `payload`, trying `strategies` in order.
///
/// # Errors
///
/// - [`FetchError::EmptyPayload`] when the located array has no elements.
/// - [`FetchError::Shape`] when no strategy matches.
pub fn extract_records_with(
    mut payload: Value,
    strategies: &[ShapeStrategy],
) -> Result<Vec<RawRecord>, FetchError> {
    let diagnostic = diagnostic_detail(&payload);

    for strategy in strategies {
        if let Some(items) = strategy.take(&mut payload) {
            if items.is_empty() {
                return Err(FetchError::EmptyPayload { detail: diagnostic });
            }
            tracing::debug!(?strategy, records = items.len(), "located supplier records");
            return Ok(items.into_iter().map(RawRecord::from_value).collect());
        }
    }

    let detail = diagnostic.unwrap_or_else(|| describe(&payload));
    Err(FetchError::Shape { detail })
}

fn diagnostic_detail(payload: &Value) -> Option<String> {
    let obj = payload.as_object()?;
    DIAGNOSTIC_KEYS.iter().find_map(|want| {
        let (_, v) = obj.iter().find(|(k, _)| k.eq_ignore_ascii_case(want))?;
        match v {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.trim().to_string()),
            other => Some(other.to_string()),
        }
    })
}

fn describe(payload: &Value) -> String {
    match payload {
        Value::Object(obj) if obj.is_empty() => "payload is an empty object".to_string(),
        Value::Object(obj) => {
            let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
            format!("no record array found; top-level keys: {}", keys.join(", "))
        }
        Value::Null => "payload is null".to_string(),
        Value::Bool(_) => "payload is a boolean".to_string(),
        Value::Number(_) => "payload is a number".to_string(),
        Value::String(_) => "payload is a string".to_string(),
        Value::Array(_) => "payload is an array".to_string(),
    }
}
