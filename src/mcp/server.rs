use anyhow::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error, warn};

use crate::fastalert::FastalertClient;

use super::handlers::RequestHandler;
use super::types::*;

pub const SERVER_NAME: &str = "fastalert";

pub struct McpServer {
    handler: Arc<RequestHandler>,
    initialized: Arc<RwLock<bool>>,
}

impl McpServer {
    pub fn new(client: Arc<FastalertClient>) -> Self {
        Self {
            handler: Arc::new(RequestHandler::new(client)),
            initialized: Arc::new(RwLock::new(false)),
        }
    }

    /// Serve the protocol over stdin/stdout until stdin closes
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve newline-delimited JSON-RPC from `reader`, replying on `writer`
    ///
    /// Tool calls run on their own tasks so a host may pipeline them; every
    /// other method is answered in arrival order. Returns once the reader is
    /// exhausted and all in-flight calls have replied.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();

        let read_loop = async move {
            let mut lines = reader.lines();

            while let Some(line) = lines.next_line().await? {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                let request = match parse_request(trimmed) {
                    Ok(request) => request,
                    Err(response) => {
                        let _ = tx.send(response);
                        continue;
                    }
                };

                if request.method == "tools/call" {
                    let server = self.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        if let Some(response) = server.handle_request(request).await {
                            let _ = tx.send(response);
                        }
                    });
                } else if let Some(response) = self.handle_request(request).await {
                    let _ = tx.send(response);
                }
            }

            debug!("Input closed, waiting for in-flight requests");
            Ok::<_, anyhow::Error>(())
        };

        let write_loop = async {
            while let Some(response) = rx.recv().await {
                let response_str = serde_json::to_string(&response)?;

                writer.write_all(response_str.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Ok::<_, anyhow::Error>(())
        };

        tokio::try_join!(read_loop, write_loop)?;
        Ok(())
    }

    /// Handle one raw message; `None` means no reply is due (notification)
    #[cfg(test)]
    async fn process_request(&self, input: &str) -> Option<JsonRpcResponse> {
        match parse_request(input) {
            Ok(request) => self.handle_request(request).await,
            Err(response) => Some(response),
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.id.clone();

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(request).await.map(Some),
            "initialized" | "notifications/initialized" => self.handle_initialized(request).await,
            "tools/list" => self.handle_list_tools(request).await.map(Some),
            "tools/call" => self.handle_call_tool(request).await.map(Some),
            "prompts/list" => Ok(Some(JsonRpcResponse::success(
                request.id,
                serde_json::json!({ "prompts": [] }),
            ))),
            "resources/list" => Ok(Some(JsonRpcResponse::success(
                request.id,
                serde_json::json!({ "resources": [] }),
            ))),
            "ping" => Ok(Some(JsonRpcResponse::success(
                request.id,
                serde_json::json!({}),
            ))),
            _ if request.id.is_none() => {
                debug!("Ignoring notification: {}", request.method);
                Ok(None)
            }
            _ => {
                warn!("Unknown method: {}", request.method);
                Ok(Some(JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::method_not_found(&request.method),
                )))
            }
        };

        result.unwrap_or_else(|e| {
            error!("Error processing request: {}", e);
            Some(JsonRpcResponse::error(
                id,
                JsonRpcError::internal_error(e.to_string()),
            ))
        })
    }

    async fn handle_initialize(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        let params: InitializeRequest = match request.params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return Ok(JsonRpcResponse::error(
                        request.id,
                        JsonRpcError::invalid_params(format!("Invalid params: {}", e)),
                    ));
                }
            },
            None => {
                return Ok(JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params("Missing params".to_string()),
                ));
            }
        };

        // Support both protocol versions
        let protocol_version = if params.protocol_version.starts_with("2025") {
            PROTOCOL_VERSION_2025.to_string()
        } else {
            PROTOCOL_VERSION.to_string()
        };

        if let Some(client) = &params.client_info {
            debug!(
                client = client.name.as_str(),
                version = client.version.as_str(),
                "Client connected"
            );
        }

        let result = InitializeResult {
            protocol_version,
            capabilities: ServerCapabilities {
                tools: HashMap::new(),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        Ok(JsonRpcResponse::success(
            request.id,
            serde_json::to_value(result)?,
        ))
    }

    async fn handle_initialized(&self, request: JsonRpcRequest) -> Result<Option<JsonRpcResponse>> {
        let mut initialized = self.initialized.write().await;
        *initialized = true;

        // Notifications don't get responses
        if request.id.is_none() {
            Ok(None)
        } else {
            Ok(Some(JsonRpcResponse::success(request.id, Value::Null)))
        }
    }

    async fn handle_list_tools(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        if !*self.initialized.read().await {
            return Ok(JsonRpcResponse::error(
                request.id,
                JsonRpcError::internal_error("Server not initialized".to_string()),
            ));
        }

        let result = ListToolsResult {
            tools: self.handler.list_tools(),
        };

        Ok(JsonRpcResponse::success(
            request.id,
            serde_json::to_value(result)?,
        ))
    }

    async fn handle_call_tool(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        if !*self.initialized.read().await {
            return Ok(JsonRpcResponse::error(
                request.id,
                JsonRpcError::internal_error("Server not initialized".to_string()),
            ));
        }

        let params: CallToolRequest = match request.params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return Ok(JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params(format!("Invalid params: {}", e)),
                ));
            }
            None => {
                return Ok(JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params("Missing params".to_string()),
                ));
            }
        };

        // Tool failures are already folded into the result
        let result = self.handler.call_tool(&params.name, params.arguments).await;

        Ok(JsonRpcResponse::success(
            request.id,
            serde_json::to_value(result)?,
        ))
    }
}

fn parse_request(input: &str) -> std::result::Result<JsonRpcRequest, JsonRpcResponse> {
    let value: Value = match serde_json::from_str(input) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to parse request: {}", e);
            return Err(JsonRpcResponse::error(None, JsonRpcError::parse_error()));
        }
    };

    // Well-formed JSON that isn't a request still gets its id echoed back
    let id = value.get("id").cloned().filter(|id| !id.is_null());

    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(req) => req,
        Err(e) => {
            warn!("Invalid request: {}", e);
            return Err(JsonRpcResponse::error(id, JsonRpcError::invalid_request()));
        }
    };

    if request.jsonrpc != "2.0" {
        return Err(JsonRpcResponse::error(
            request.id,
            JsonRpcError::invalid_request(),
        ));
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConnectionConfig, FastalertConfig};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn server_for(base_url: &str) -> Arc<McpServer> {
        let settings = FastalertConfig::new("test-key", base_url);
        let client = FastalertClient::new(&settings, &ConnectionConfig::default()).unwrap();
        Arc::new(McpServer::new(Arc::new(client)))
    }

    fn request(id: i64, method: &str, params: Value) -> String {
        json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}).to_string()
    }

    async fn initialize(server: &McpServer) {
        server
            .process_request(&request(
                0,
                "initialize",
                json!({"protocolVersion": "2025-06-18", "capabilities": {}}),
            ))
            .await;
        server
            .process_request(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
    }

    #[tokio::test]
    async fn test_initialize_negotiates_version() {
        let server = server_for("http://localhost");

        let response = server
            .process_request(&request(
                1,
                "initialize",
                json!({
                    "protocolVersion": "2025-03-26",
                    "capabilities": {},
                    "clientInfo": {"name": "host", "version": "1.0"}
                }),
            ))
            .await
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION_2025);
        assert_eq!(result["serverInfo"]["name"], "fastalert");
        assert_eq!(result["capabilities"], json!({"tools": {}}));
    }

    #[tokio::test]
    async fn test_initialized_notification_has_no_reply() {
        let server = server_for("http://localhost");

        let response = server
            .process_request(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;

        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_tools_list_requires_initialization() {
        let server = server_for("http://localhost");

        let response = server
            .process_request(&request(2, "tools/list", json!({})))
            .await
            .unwrap();

        assert_eq!(response.error.unwrap().code, error_codes::INTERNAL_ERROR);
    }

    #[tokio::test]
    async fn test_tools_list_after_initialization() {
        let server = server_for("http://localhost");
        initialize(&server).await;

        let response = server
            .process_request(&request(2, "tools/list", json!({})))
            .await
            .unwrap();

        let tools = response.result.unwrap()["tools"].clone();
        assert_eq!(tools[0]["name"], "list_channels");
        assert_eq!(tools[1]["name"], "send_message");
        assert_eq!(
            tools[1]["inputSchema"]["properties"]["channel-uuid"]["minItems"],
            1
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_is_in_band_error() {
        let server = server_for("http://localhost");
        initialize(&server).await;

        let response = server
            .process_request(&request(
                3,
                "tools/call",
                json!({"name": "unknown_tool", "arguments": {}}),
            ))
            .await
            .unwrap();

        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert!(
            result["content"][0]["text"]
                .as_str()
                .unwrap()
                .contains("unknown_tool")
        );
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let server = server_for("http://localhost");

        let parse = server.process_request("{not json").await.unwrap();
        assert_eq!(parse.error.unwrap().code, error_codes::PARSE_ERROR);

        let not_a_request = server
            .process_request(r#"{"jsonrpc":"2.0","id":9,"params":{}}"#)
            .await
            .unwrap();
        assert_eq!(not_a_request.id, Some(json!(9)));
        assert_eq!(
            not_a_request.error.unwrap().code,
            error_codes::INVALID_REQUEST
        );

        let not_an_object = server.process_request("[1, 2]").await.unwrap();
        assert_eq!(not_an_object.id, None);
        assert_eq!(
            not_an_object.error.unwrap().code,
            error_codes::INVALID_REQUEST
        );

        let version = server
            .process_request(r#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#)
            .await
            .unwrap();
        assert_eq!(version.error.unwrap().code, error_codes::INVALID_REQUEST);

        let unknown = server
            .process_request(&request(4, "sampling/createMessage", json!({})))
            .await
            .unwrap();
        assert_eq!(unknown.error.unwrap().code, error_codes::METHOD_NOT_FOUND);

        initialize(&server).await;
        let missing = server
            .process_request(r#"{"jsonrpc":"2.0","id":5,"method":"tools/call"}"#)
            .await
            .unwrap();
        assert_eq!(missing.error.unwrap().code, error_codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_serve_session_over_streams() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organization/channels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"data": [{"uuid": "u1", "name": "ops"}]}
            })))
            .expect(1)
            .mount(&upstream)
            .await;

        let server = server_for(&upstream.uri());
        let input = [
            request(1, "initialize", json!({"protocolVersion": "2024-11-05", "capabilities": {}})),
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#.to_string(),
            String::new(),
            request(2, "tools/call", json!({"name": "list_channels"})),
            request(3, "tools/call", json!({"name": "unknown_tool", "arguments": {}})),
        ]
        .join("\n");

        let mut output = Vec::new();
        server
            .serve(BufReader::new(input.as_bytes()), &mut output)
            .await
            .unwrap();

        let responses: HashMap<i64, Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str::<Value>(line).unwrap())
            .map(|v| (v["id"].as_i64().unwrap(), v))
            .collect();

        assert_eq!(responses.len(), 3);
        assert_eq!(
            responses[&1]["result"]["protocolVersion"],
            PROTOCOL_VERSION
        );
        assert_eq!(
            responses[&2]["result"]["content"][0]["text"],
            "• {\"name\":\"ops\",\"uuid\":\"u1\"}"
        );
        assert!(responses[&2]["result"].get("isError").is_none());
        assert_eq!(responses[&3]["result"]["isError"], true);
    }
}
