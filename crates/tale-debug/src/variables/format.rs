//! Value formatting for the variables view.
//! - format_value: client-facing value text
//! - child paths: evaluateName for expanded children

use tale_eval::{format_number, Value};

pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Bool(value) => value.to_string(),
        Value::Number(value) => format_number(*value),
        Value::String(value) => quote_string(value),
        Value::Array(_) | Value::Map(_) => {
            format!("table[{}]", value.child_count().unwrap_or_default())
        }
        Value::Callable(_) => "function".to_string(),
    }
}

/// Double-quotes `text`, escaping quotes, backslashes and control characters.
pub(crate) fn quote_string(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            ch if ch.is_control() => quoted.push_str(&format!("\\u{{{:x}}}", ch as u32)),
            ch => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first == '_' || first.is_ascii_alphabetic())
        && chars.all(|ch| ch == '_' || ch.is_ascii_alphanumeric())
        && !matches!(name, "and" | "or" | "not" | "true" | "false" | "nil")
}

/// Expression naming field `key` of the value at `parent`.
pub(crate) fn field_path(parent: Option<&str>, key: &str) -> Option<String> {
    match parent {
        None => is_identifier(key).then(|| key.to_string()),
        Some(parent) if is_identifier(key) => Some(format!("{parent}.{key}")),
        Some(parent) => Some(format!("{parent}[{}]", quote_string(key))),
    }
}

/// Expression naming 1-based element `index` of the value at `parent`.
pub(crate) fn index_path(parent: Option<&str>, index: usize) -> Option<String> {
    parent.map(|parent| format!("{parent}[{index}]"))
}
