use crate::error::{McpError, McpResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parse JSON value into a typed parameter struct
///
/// Missing arguments (`null`) are treated as an empty object so tools whose
/// inputs are all optional can be called without any.
pub fn parse_params<T: DeserializeOwned>(params: Value) -> McpResult<T> {
    let params = if params.is_null() {
        Value::Object(Default::default())
    } else {
        params
    };

    serde_json::from_value(params)
        .map_err(|e| McpError::InvalidParameter(format!("Invalid parameters: {}", e)))
}

/// Validate that a list argument has at least `min` entries
pub fn validate_min_items<T>(items: &[T], min: usize, field_name: &str) -> McpResult<()> {
    if items.len() < min {
        return Err(McpError::InvalidParameter(format!(
            "'{}' must contain at least {} item{}",
            field_name,
            min,
            if min == 1 { "" } else { "s" }
        )));
    }
    Ok(())
}
