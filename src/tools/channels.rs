use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::Tool;
use crate::error::McpResult;
use crate::fastalert::{ChannelFilter, FastalertClient};
use crate::mcp::types::{Property, ToolInputSchema};
use crate::utils::parse_params;

pub struct ListChannelsTool {
    client: Arc<FastalertClient>,
}

impl ListChannelsTool {
    pub fn new(client: Arc<FastalertClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct ListChannelsParams {
    name: Option<String>,
}

#[async_trait]
impl Tool for ListChannelsTool {
    fn description(&self) -> &str {
        "List all channels, optionally filtered by name."
    }

    fn input_schema(&self) -> ToolInputSchema {
        let mut props = HashMap::new();
        props.insert(
            "name".to_string(),
            Property::string("Optional channel name filter"),
        );
        ToolInputSchema::object(props, vec![])
    }

    async fn execute(&self, params: Value) -> McpResult<Value> {
        let params: ListChannelsParams = parse_params(params)?;

        let channels = self
            .client
            .search_channels(&ChannelFilter { name: params.name })
            .await?;

        Ok(channels)
    }
}
