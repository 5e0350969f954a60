use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageAction {
    Call,
    Email,
    Website,
    Image,
}

impl MessageAction {
    pub const ALL: [&'static str; 4] = ["call", "email", "website", "image"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "channel-uuid")]
    pub channel_uuid: Vec<String>,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<MessageAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_value: Option<String>,
    /// Image URL or encoded binary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Extra tool arguments, forwarded to the API as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    pub fn new(
        channel_uuid: Vec<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            channel_uuid,
            title: title.into(),
            content: content.into(),
            action: None,
            action_value: None,
            image: None,
            extra: Map::new(),
        }
    }
}

/// Query parameters for the channel listing endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
