use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

use super::Tool;
use crate::error::McpResult;
use crate::fastalert::{FastalertClient, Message, MessageAction};
use crate::mcp::types::{Property, ToolInputSchema};
use crate::utils::{parse_params, validate_min_items};

const CHANNEL_UUID_FIELD: &str = "channel-uuid";
const MIN_CHANNELS: usize = 1;

pub struct SendMessageTool {
    client: Arc<FastalertClient>,
}

impl SendMessageTool {
    pub fn new(client: Arc<FastalertClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for SendMessageTool {
    fn description(&self) -> &str {
        "Send a message to one or more channels."
    }

    fn input_schema(&self) -> ToolInputSchema {
        let mut props = HashMap::new();
        props.insert(
            CHANNEL_UUID_FIELD.to_string(),
            Property::string_array("Channel UUIDs to send to.", MIN_CHANNELS)
                .with_item_example(json!("abc-cl1-xyz-123")),
        );
        props.insert("title".to_string(), Property::string("Message title."));
        props.insert("content".to_string(), Property::string("Message body."));
        props.insert(
            "action".to_string(),
            Property::string_enum("Optional message action type.", &MessageAction::ALL),
        );
        props.insert(
            "action_value".to_string(),
            Property::string("Value corresponding to the action type."),
        );
        props.insert(
            "image".to_string(),
            Property::string("Optional image URL or binary string."),
        );

        ToolInputSchema::object(
            props,
            vec![
                CHANNEL_UUID_FIELD.to_string(),
                "title".to_string(),
                "content".to_string(),
            ],
        )
    }

    async fn execute(&self, params: Value) -> McpResult<Value> {
        let message: Message = parse_params(params)?;
        validate_min_items(&message.channel_uuid, MIN_CHANNELS, CHANNEL_UUID_FIELD)?;

        let sent = self.client.send_message(&message).await?;

        Ok(sent)
    }
}
