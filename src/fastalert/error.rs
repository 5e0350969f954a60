use serde_json::Value;
use thiserror::Error;

pub const VALIDATION_ERROR_CODE: &str = "VALIDATION_ERROR";
const VALIDATION_STATUS: u16 = 422;
const VALIDATION_FALLBACK: &str = "Validation error occurred";
const FAULT_FALLBACK: &str = "API request failed";

/// Failure talking to the FastAlert API
#[derive(Error, Debug)]
pub enum ApiError {
    /// Upstream rejected the payload (HTTP 422)
    #[error("{message}")]
    Validation { message: String },

    /// Any other non-success response
    #[error("{message}")]
    Fault {
        message: String,
        code: Option<String>,
        status: u16,
    },

    /// No response was received; passed through untouched
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("API key is required")]
    MissingApiKey,

    #[error("API key is not a valid header value")]
    InvalidApiKey,
}

impl ApiError {
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Validation { .. } => Some(VALIDATION_ERROR_CODE),
            ApiError::Fault { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Validation { .. } => Some(VALIDATION_STATUS),
            ApiError::Fault { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Build the error for a non-success response from its status and raw body
pub fn normalize(status: u16, body: &str) -> ApiError {
    let body: Value = serde_json::from_str(body).unwrap_or(Value::Null);

    if status == VALIDATION_STATUS {
        let detail = [
            body.get("errors"),
            body.pointer("/fault/detail"),
            body.get("message"),
        ]
        .into_iter()
        .flatten()
        .find(|v| is_present(v));

        let detail = match detail {
            Some(v) if v.is_object() || v.is_array() => {
                serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
            }
            Some(v) => scalar_text(v),
            None => VALIDATION_FALLBACK.to_string(),
        };

        return ApiError::Validation {
            message: format!("Validation Error: {}", detail),
        };
    }

    let message = body
        .pointer("/fault/faultstring")
        .filter(|v| is_present(v))
        .map(scalar_text)
        .unwrap_or_else(|| FAULT_FALLBACK.to_string());

    let code = body
        .pointer("/fault/detail/errorcode")
        .filter(|v| is_present(v))
        .map(scalar_text);

    ApiError::Fault {
        message,
        code,
        status,
    }
}

// null, false, 0 and "" count as missing
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
