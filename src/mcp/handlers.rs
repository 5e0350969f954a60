use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{McpError, McpResult};
use crate::fastalert::FastalertClient;
use crate::tools::{Tool, channels, format_error, format_success, messages};

use super::types::{CallToolResult, Tool as McpTool};

pub struct RequestHandler {
    tools: HashMap<String, Box<dyn Tool + Send + Sync>>,
}

macro_rules! register_tool {
    ($tools:expr, $name:expr, $tool:expr) => {
        $tools.insert($name.to_string(), Box::new($tool));
    };
}

impl RequestHandler {
    pub fn new(client: Arc<FastalertClient>) -> Self {
        let mut tools: HashMap<String, Box<dyn Tool + Send + Sync>> = HashMap::new();

        register_tool!(
            tools,
            "list_channels",
            channels::ListChannelsTool::new(client.clone())
        );
        register_tool!(
            tools,
            "send_message",
            messages::SendMessageTool::new(client.clone())
        );

        Self { tools }
    }

    pub fn list_tools(&self) -> Vec<McpTool> {
        let mut tool_list: Vec<McpTool> = self
            .tools
            .iter()
            .map(|(name, tool)| McpTool {
                name: name.clone(),
                description: tool.description().to_string(),
                input_schema: tool.input_schema(),
            })
            .collect();

        tool_list.sort_by(|a, b| a.name.cmp(&b.name));
        tool_list
    }

    /// Run a tool and render the outcome; failures come back flagged, never as `Err`
    pub async fn call_tool(&self, name: &str, arguments: Value) -> CallToolResult {
        match self.execute(name, arguments).await {
            Ok(result) => {
                debug!(tool = name, "Tool call succeeded");
                CallToolResult::text(format_success(&result))
            }
            Err(e) => {
                warn!(tool = name, "Tool call failed: {}", e);
                CallToolResult::error(format_error(&e))
            }
        }
    }

    async fn execute(&self, name: &str, arguments: Value) -> McpResult<Value> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| McpError::UnknownTool(name.to_string()))?;

        tool.execute(arguments).await
    }
}
