//! Runtime values as seen by the debugger.
//!
//! Story engines hand their state to the debugger as a flat [`Context`] of
//! [`Value`]s. Values are snapshots: nothing here aliases live engine state.

use std::fmt;

use indexmap::IndexMap;
use smol_str::SmolStr;

/// Flat variable context used for conditions, logpoints and `evaluate`.
pub type Context = IndexMap<SmolStr, Value>;

/// A story value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value.
    #[default]
    Nil,
    /// Boolean.
    Bool(bool),
    /// Number (story languages do not distinguish integers).
    Number(f64),
    /// String.
    String(SmolStr),
    /// Ordered list, 1-based from the story's point of view.
    Array(Vec<Value>),
    /// Named fields in insertion order.
    Map(IndexMap<SmolStr, Value>),
    /// Engine function; opaque to the debugger.
    Callable(SmolStr),
}

impl Value {
    /// Type name shown to clients.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) | Value::Map(_) => "table",
            Value::Callable(_) => "function",
        }
    }

    /// Everything except `nil` and `false` is truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Whether this value has children a client can expand.
    #[must_use]
    pub fn is_composite(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Map(_))
    }

    /// Element or key count for composite values.
    #[must_use]
    pub fn child_count(&self) -> Option<usize> {
        match self {
            Value::Array(items) => Some(items.len()),
            Value::Map(fields) => Some(fields.len()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

/// Display text: strings unquoted, numbers in default formatting,
/// composites as `table[N]`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Number(value) => f.write_str(&format_number(*value)),
            Value::String(value) => f.write_str(value),
            Value::Array(items) => write!(f, "table[{}]", items.len()),
            Value::Map(fields) => write!(f, "table[{}]", fields.len()),
            Value::Callable(_) => f.write_str("function"),
        }
    }
}

/// Default numeric formatting: integral values print without a fraction.
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    format!("{value}")
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(SmolStr::new(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(SmolStr::from(value))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

/// JSON key that marks an engine function in recorded state.
pub const FUNCTION_MARKER: &str = "$function";

/// Converts recorded JSON state. `{"$function": "name"}` becomes a callable.
impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(flag) => Value::Bool(flag),
            serde_json::Value::Number(number) => Value::Number(number.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(text) => Value::String(SmolStr::from(text)),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => {
                if fields.len() == 1 {
                    if let Some(serde_json::Value::String(name)) = fields.get(FUNCTION_MARKER) {
                        return Value::Callable(SmolStr::new(name));
                    }
                }
                Value::Map(
                    fields
                        .into_iter()
                        .map(|(key, value)| (SmolStr::from(key), Value::from(value)))
                        .collect(),
                )
            }
        }
    }
}

/// Builds a [`Context`] from `(name, value)` pairs.
pub fn context<I, K, V>(entries: I) -> Context
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<SmolStr>,
    V: Into<Value>,
{
    entries
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_format_without_trailing_fraction() {
        assert_eq!(Value::Number(42.0).to_string(), "42");
        assert_eq!(Value::Number(3.5).to_string(), "3.5");
        assert_eq!(Value::Number(-0.25).to_string(), "-0.25");
        assert_eq!(Value::Number(f64::INFINITY).to_string(), "inf");
    }

    #[test]
    fn composites_display_their_size() {
        let array = Value::Array(vec!["a".into(), "b".into()]);
        assert_eq!(array.to_string(), "table[2]");
        assert_eq!(array.type_name(), "table");
    }

    #[test]
    fn json_state_converts_with_function_marker() {
        let value = Value::from(json!({
            "name": "Ada",
            "visits": 3,
            "greet": { "$function": "greet" },
            "items": [true, null]
        }));
        let Value::Map(fields) = value else {
            panic!("expected map");
        };
        assert_eq!(fields["name"], Value::from("Ada"));
        assert_eq!(fields["visits"], Value::Number(3.0));
        assert_eq!(fields["greet"], Value::Callable("greet".into()));
        assert_eq!(
            fields["items"],
            Value::Array(vec![Value::Bool(true), Value::Nil])
        );
    }

    #[test]
    fn truthiness_matches_story_semantics() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::from("").is_truthy());
    }
}
