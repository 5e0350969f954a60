use serde_json::Value;
use std::fmt::Display;

/// Marker prepended to every failed tool reply
pub const ERROR_PREFIX: &str = "❌ Error: ";

const BULLET: &str = "• ";

/// Render a successful tool result as reply text
///
/// Lists become one bullet per item holding its compact JSON, strings are
/// passed through, and anything else is pretty-printed.
pub fn format_success(data: &Value) -> String {
    match data {
        Value::Array(items) => items
            .iter()
            .map(|item| format!("{}{}", BULLET, item))
            .collect::<Vec<_>>()
            .join("\n"),
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Render a tool failure as reply text
pub fn format_error(err: &dyn Display) -> String {
    format!("{}{}", ERROR_PREFIX, err)
}
