// MCP protocol types and definitions (JSON-RPC 2.0, one message per line)

use salesdesk_core::Record;
use serde::{Deserialize, Serialize};

/// MCP protocol revision spoken by server and client
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC 2.0 Request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    pub fn new(
        id: impl Into<serde_json::Value>,
        method: impl Into<String>,
        params: Option<serde_json::Value>,
    ) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(id.into()),
            method: method.into(),
            params,
        }
    }

    pub fn notification(method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: method.into(),
            params,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: impl Into<serde_json::Value>, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.into(),
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: impl Into<serde_json::Value>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.into(),
            result: None,
            error: Some(error),
        }
    }

    /// Serialize `result` into a success response, degrading to an internal error
    pub fn from_result<T: Serialize>(id: impl Into<serde_json::Value>, result: &T) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => Self::success(id, value),
            Err(e) => Self::error(
                id,
                JsonRpcError::internal_error(format!("Failed to serialize result: {}", e)),
            ),
        }
    }
}

/// JSON-RPC 2.0 Error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    pub fn parse_error() -> Self {
        Self {
            code: Self::PARSE_ERROR,
            message: "Parse error".to_string(),
            data: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: Self::INVALID_REQUEST,
            message: message.into(),
            data: None,
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: Self::METHOD_NOT_FOUND,
            message: format!("Method not found: {}", method),
            data: None,
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: Self::INVALID_PARAMS,
            message: message.into(),
            data: None,
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self {
            code: Self::INTERNAL_ERROR,
            message: message.into(),
            data: None,
        }
    }
}

// Invocation wire contract

/// Why an invocation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ToolNotFound,
    InvalidParameters,
    ExecutionError,
    Timeout,
    ConnectionError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToolNotFound => "tool_not_found",
            Self::InvalidParameters => "invalid_parameters",
            Self::ExecutionError => "execution_error",
            Self::Timeout => "timeout",
            Self::ConnectionError => "connection_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure of one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct InvocationError {
    pub kind: ErrorKind,
    pub message: String,
    /// Offending parameter, for `invalid_parameters`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

impl InvocationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            parameter: None,
        }
    }

    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = Some(parameter.into());
        self
    }
}

/// `{tool, params}` as sent by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub tool: String,
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl InvocationRequest {
    pub fn new(tool: impl Into<String>, params: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            tool: tool.into(),
            params,
        }
    }
}

/// `{status: "ok", payload}` or `{status: "error", error}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvocationResult {
    Ok { payload: Vec<Record> },
    Error { error: InvocationError },
}

impl InvocationResult {
    pub fn success(payload: Vec<Record>) -> Self {
        Self::Ok { payload }
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Error {
            error: InvocationError::new(kind, message),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    pub fn payload(&self) -> Option<&[Record]> {
        match self {
            Self::Ok { payload } => Some(payload),
            Self::Error { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&InvocationError> {
        match self {
            Self::Ok { .. } => None,
            Self::Error { error } => Some(error),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(|e| e.kind)
    }

    pub fn into_result(self) -> Result<Vec<Record>, InvocationError> {
        match self {
            Self::Ok { payload } => Ok(payload),
            Self::Error { error } => Err(error),
        }
    }
}

impl From<InvocationError> for InvocationResult {
    fn from(error: InvocationError) -> Self {
        Self::Error { error }
    }
}

// MCP-specific protocol messages

/// Tool definition for MCP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// List tools response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListToolsResult {
    pub tools: Vec<ToolSchema>,
}

/// Call tool request params
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<serde_json::Value>,
}

/// Call tool response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    pub content: Vec<ToolContent>,
    #[serde(
        rename = "structuredContent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub structured_content: Option<InvocationResult>,
    #[serde(rename = "isError", default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl From<InvocationResult> for CallToolResult {
    fn from(result: InvocationResult) -> Self {
        let (content, is_error) = match &result {
            InvocationResult::Ok { payload } => {
                let text = serde_json::to_string_pretty(payload)
                    .unwrap_or_else(|e| format!("<unrenderable payload: {}>", e));
                (ToolContent::text(text), None)
            }
            InvocationResult::Error { error } => (ToolContent::error(error.to_string()), Some(true)),
        };

        Self {
            content: vec![content],
            structured_content: Some(result),
            is_error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
}

impl ToolContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::Text {
            text: format!("Error: {}", text.into()),
        }
    }
}

/// Initialize request params
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeParams {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: ClientCapabilities,
    #[serde(rename = "clientInfo")]
    pub client_info: ClientInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientCapabilities {
    #[serde(default)]
    pub experimental: serde_json::Value,
    #[serde(default)]
    pub sampling: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// Initialize response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub tools: Option<ToolsCapability>,
    #[serde(default)]
    pub experimental: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsCapability {
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invocation_wire_shape() {
        let request = InvocationRequest {
            tool: "GetTopSellingProducts".to_string(),
            params: json!({"shop_id": 1, "limit": 3}).as_object().unwrap().clone(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"tool": "GetTopSellingProducts", "params": {"shop_id": 1, "limit": 3}})
        );

        let ok = InvocationResult::success(vec![json!({"product": "A", "quantity_sold": 42})
            .as_object()
            .unwrap()
            .clone()]);
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"status": "ok", "payload": [{"product": "A", "quantity_sold": 42}]})
        );

        let err = InvocationResult::from(
            InvocationError::new(ErrorKind::InvalidParameters, "missing required parameter 'shop_id'")
                .with_parameter("shop_id"),
        );
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "status": "error",
                "error": {
                    "kind": "invalid_parameters",
                    "message": "missing required parameter 'shop_id'",
                    "parameter": "shop_id"
                }
            })
        );
    }

    #[test]
    fn test_request_and_result_survive_serialization() {
        let request: InvocationRequest =
            serde_json::from_str(r#"{"tool":"GetCustomerOrders","params":{"customer_id":5}}"#).unwrap();
        let result = InvocationResult::failure(ErrorKind::ExecutionError, "store unavailable");

        let pair = (request.clone(), result.clone());
        let text = serde_json::to_string(&pair).unwrap();
        let back: (InvocationRequest, InvocationResult) = serde_json::from_str(&text).unwrap();

        assert_eq!(back, pair);
    }

    #[test]
    fn test_request_params_default_to_empty() {
        let request: InvocationRequest = serde_json::from_str(r#"{"tool":"GetShopPerformance"}"#).unwrap();
        assert!(request.params.is_empty());
    }

    #[test]
    fn test_call_tool_result_from_failure() {
        let result: CallToolResult =
            InvocationResult::failure(ErrorKind::ToolNotFound, "tool 'Nope' is not registered").into();

        assert_eq!(result.is_error, Some(true));
        assert_eq!(
            result.content,
            vec![ToolContent::text("Error: tool_not_found: tool 'Nope' is not registered")]
        );

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["isError"], true);
        assert_eq!(value["structuredContent"]["status"], "error");
    }

    #[test]
    fn test_notification_has_no_id() {
        let notification = JsonRpcRequest::notification("notifications/initialized", None);
        assert!(notification.is_notification());

        let value = serde_json::to_value(&notification).unwrap();
        assert_eq!(value, json!({"jsonrpc": "2.0", "method": "notifications/initialized"}));
    }
}
