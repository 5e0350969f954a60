pub mod error;
pub mod types;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{ConnectionConfig, FastalertConfig};

pub use error::ApiError;
pub use types::{ChannelFilter, Message, MessageAction};

const API_KEY_HEADER: &str = "x-api-key";
const CHANNELS_PATH: &str = "/organization/channels";
const SEND_MESSAGE_PATH: &str = "/send-message";

/// HTTP client for the FastAlert REST API
///
/// Records coming back from the API are handed over as raw JSON; the
/// service owns their shape and nothing here reinterprets them.
#[derive(Debug, Clone)]
pub struct FastalertClient {
    http: reqwest::Client,
    base_url: String,
}

impl FastalertClient {
    pub fn new(
        settings: &FastalertConfig,
        connection: &ConnectionConfig,
    ) -> Result<Self, ApiError> {
        let api_key = settings.api_key.trim();
        if api_key.is_empty() {
            return Err(ApiError::MissingApiKey);
        }

        let mut api_key = HeaderValue::from_str(api_key).map_err(|_| ApiError::InvalidApiKey)?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(API_KEY_HEADER), api_key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if connection.timeout_seconds > 0 {
            builder = builder.timeout(Duration::from_secs(connection.timeout_seconds));
        }

        Ok(Self {
            http: builder.build()?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List channels, optionally filtered by name
    pub async fn search_channels(&self, filter: &ChannelFilter) -> Result<Value, ApiError> {
        let request = self.http.get(self.url(CHANNELS_PATH)).query(filter);
        self.execute(request, CHANNELS_PATH).await
    }

    /// Send a message to one or more channels, returning the created records
    pub async fn send_message(&self, message: &Message) -> Result<Value, ApiError> {
        let request = self.http.post(self.url(SEND_MESSAGE_PATH)).json(message);
        self.execute(request, SEND_MESSAGE_PATH).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<Value, ApiError> {
        debug!(path, "FastAlert request");

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = error::normalize(status.as_u16(), &body);
            warn!(
                path,
                status = status.as_u16(),
                code = ?err.code(),
                "FastAlert request failed: {}",
                err
            );
            return Err(err);
        }

        Ok(unwrap_records(&body))
    }
}

/// Pull `data.data` out of a success body; anything missing means no records
fn unwrap_records(body: &str) -> Value {
    let Ok(mut value) = serde_json::from_str::<Value>(body) else {
        debug!("FastAlert response body is not JSON, treating as empty");
        return Value::Array(Vec::new());
    };

    match value.pointer_mut("/data/data").map(Value::take) {
        None | Some(Value::Null) => Value::Array(Vec::new()),
        Some(records) => records,
    }
}
