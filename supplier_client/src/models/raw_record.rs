//! One untyped record as delivered by the supplier.
//!
//! [`RawRecord`] keeps the original JSON object and an index from normalized key
//! to original key so that [`Field`] lookups tolerate spelling variants. Accessors
//! are lossy by design of the upstream data: they return `None` for anything that
//! cannot be read as the requested type instead of failing.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::models::field::{Field, normalize_key};

/// A single supplier record.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    fields: Map<String, Value>,
    index: HashMap<String, String>,
}

impl RawRecord {
    /// Wraps a JSON object.
    pub fn from_map(fields: Map<String, Value>) -> Self {
        let mut index = HashMap::with_capacity(fields.len());
        for key in fields.keys() {
            // First spelling wins if the supplier sends two that normalize alike.
            index.entry(normalize_key(key)).or_insert_with(|| key.clone());
        }
        Self { fields, index }
    }

    /// Wraps any JSON value. Non-objects become an empty record, which the
    /// transformer will skip for lack of an identifier.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::from_map(map),
            _ => Self::from_map(Map::new()),
        }
    }

    /// The underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// First non-null value among the field's aliases.
    pub fn get(&self, field: Field) -> Option<&Value> {
        field
            .aliases()
            .iter()
            .filter_map(|alias| self.index.get(&normalize_key(alias)))
            .filter_map(|key| self.fields.get(key))
            .find(|v| !v.is_null())
    }

    /// Field rendered as trimmed text. Numbers and booleans are stringified;
    /// empty strings, arrays and objects read as absent.
    pub fn text(&self, field: Field) -> Option<String> {
        match self.get(field)? {
            Value::String(s) => {
                let t = s.trim();
                (!t.is_empty()).then(|| t.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Field read as a finite number. Strings are accepted with surrounding
    /// whitespace, thousands separators, a leading currency sign or a trailing `%`.
    pub fn number(&self, field: Field) -> Option<f64> {
        let n = match self.get(field)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => parse_lenient_f64(s)?,
            _ => return None,
        };
        n.is_finite().then_some(n)
    }

    /// The stock identifier, if present and non-blank.
    pub fn identifier(&self) -> Option<String> {
        self.text(Field::StockId)
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_map(fields)
    }
}

fn parse_lenient_f64(s: &str) -> Option<f64> {
    let t = s.trim();
    let t = t.strip_prefix('$').unwrap_or(t);
    let t = t.strip_suffix('%').unwrap_or(t).trim();
    if t.is_empty() {
        return None;
    }
    let cleaned: String = t.chars().filter(|c| *c != ',' && *c != '_').collect();
    cleaned.parse::<f64>().ok()
}
