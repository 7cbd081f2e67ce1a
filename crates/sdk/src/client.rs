//! Tool client: opens sessions against a tool server and issues invocations.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::transport::{HttpTransport, LineTransport, Transport};
use salesdesk_mcp::protocol::{
    CallToolParams, CallToolResult, ClientCapabilities, ClientInfo, ErrorKind, InitializeParams,
    InitializeResult, InvocationResult, JsonRpcRequest, ListToolsResult, ServerInfo,
    PROTOCOL_VERSION,
};
use salesdesk_mcp::tools::ToolDescriptor;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};
use url::Url;

/// Where a tool server can be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Spawn a server process and talk over its stdin/stdout.
    Process { program: String, args: Vec<String> },
    /// Connect to `host:port`.
    Tcp(String),
    /// POST JSON-RPC to an HTTP server.
    Http(Url),
}

impl FromStr for Endpoint {
    type Err = ClientError;

    /// `tcp://host:port`, `http(s)://...`, or a command line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(addr) = s.strip_prefix("tcp://") {
            if addr.is_empty() {
                return Err(ClientError::Config("tcp endpoint needs host:port".to_string()));
            }
            return Ok(Self::Tcp(addr.to_string()));
        }

        if s.starts_with("http://") || s.starts_with("https://") {
            return Ok(Self::Http(Url::parse(s)?));
        }

        let mut parts = s.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| ClientError::Config("endpoint is empty".to_string()))?;
        Ok(Self::Process {
            program,
            args: parts.collect(),
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Process { program, args } if args.is_empty() => write!(f, "{}", program),
            Self::Process { program, args } => write!(f, "{} {}", program, args.join(" ")),
            Self::Tcp(addr) => write!(f, "tcp://{}", addr),
            Self::Http(url) => write!(f, "{}", url),
        }
    }
}

/// Client for salesdesk tool servers.
#[derive(Debug, Clone, Default)]
pub struct ToolClient {
    config: Arc<ClientConfig>,
}

impl ToolClient {
    /// Create a new client builder.
    pub fn builder() -> ToolClientBuilder {
        ToolClientBuilder::new()
    }

    pub fn new(config: ClientConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Open a session and complete the `initialize` handshake.
    pub async fn connect(&self, endpoint: &Endpoint) -> ClientResult<ToolSession> {
        info!(%endpoint, "Connecting to tool server");

        let transport: Box<dyn Transport> = match endpoint {
            Endpoint::Process { program, args } => Box::new(LineTransport::spawn(program, args)?),
            Endpoint::Tcp(addr) => Box::new(LineTransport::connect_tcp(addr).await?),
            Endpoint::Http(url) => Box::new(HttpTransport::new(url.clone(), &self.config)?),
        };

        ToolSession::open(transport, self.config.clone()).await
    }

    /// Open a session over an already-connected byte stream pair.
    pub async fn connect_stream<R, W>(&self, reader: R, writer: W) -> ClientResult<ToolSession>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        ToolSession::open(
            Box::new(LineTransport::new(reader, writer)),
            self.config.clone(),
        )
        .await
    }
}

/// Builder for creating a ToolClient.
pub struct ToolClientBuilder {
    config: ClientConfig,
}

impl ToolClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// Set how long a request waits for its response.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the name announced during `initialize`.
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.config.client_name = name.into();
        self
    }

    /// Set the version announced during `initialize`.
    pub fn client_version(mut self, version: impl Into<String>) -> Self {
        self.config.client_version = version.into();
        self
    }

    /// Build the client.
    pub fn build(self) -> ClientResult<ToolClient> {
        if self.config.timeout.is_zero() {
            return Err(ClientError::Config("timeout must be non-zero".to_string()));
        }
        Ok(ToolClient::new(self.config))
    }
}

impl Default for ToolClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One connection to a tool server.
///
/// Calls take `&mut self`, so a session has at most one request in flight.
/// Dropping the session tears down its transport.
pub struct ToolSession {
    transport: Box<dyn Transport>,
    config: Arc<ClientConfig>,
    next_id: u64,
    server_info: ServerInfo,
}

impl ToolSession {
    async fn open(transport: Box<dyn Transport>, config: Arc<ClientConfig>) -> ClientResult<Self> {
        let mut session = Self {
            transport,
            config,
            next_id: 0,
            server_info: ServerInfo {
                name: String::new(),
                version: String::new(),
            },
        };

        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ClientCapabilities::default(),
            client_info: ClientInfo {
                name: session.config.client_name.clone(),
                version: session.config.client_version.clone(),
            },
        };
        let result: InitializeResult = serde_json::from_value(
            session
                .request("initialize", Some(serde_json::to_value(&params)?))
                .await?,
        )?;

        if result.protocol_version != PROTOCOL_VERSION {
            warn!(
                server = %result.protocol_version,
                client = PROTOCOL_VERSION,
                "Protocol version mismatch"
            );
        }

        session
            .transport
            .send(&JsonRpcRequest::notification("notifications/initialized", None))
            .await?;

        info!(
            server = %result.server_info.name,
            version = %result.server_info.version,
            "Connected to tool server"
        );
        session.server_info = result.server_info;
        Ok(session)
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Descriptors of every tool the server offers, in server order.
    pub async fn list_tools(&mut self) -> ClientResult<Vec<ToolDescriptor>> {
        let result: ListToolsResult =
            serde_json::from_value(self.request("tools/list", None).await?)?;

        let tools = result
            .tools
            .iter()
            .map(ToolDescriptor::from_schema)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = tools.len(), "Listed tools");
        Ok(tools)
    }

    /// Invoke a tool and wait for its result.
    ///
    /// Never fails: transport and protocol problems come back as
    /// `connection_error`, a missing response as `timeout`. There are no retries.
    pub async fn invoke(&mut self, tool: &str, params: Map<String, Value>) -> InvocationResult {
        debug!(tool, "Invoking tool");

        let call = CallToolParams {
            name: tool.to_string(),
            arguments: Some(Value::Object(params)),
        };
        let call = match serde_json::to_value(&call) {
            Ok(call) => call,
            Err(e) => return ClientError::from(e).into_invocation_result(),
        };

        let value = match self.request("tools/call", Some(call)).await {
            Ok(value) => value,
            Err(e) => {
                warn!(tool, error = %e, "Invocation failed");
                return e.into_invocation_result();
            }
        };

        match serde_json::from_value::<CallToolResult>(value) {
            Ok(CallToolResult {
                structured_content: Some(result),
                ..
            }) => result,
            Ok(_) => InvocationResult::failure(
                ErrorKind::ConnectionError,
                "tools/call response carried no structured result",
            ),
            Err(e) => InvocationResult::failure(
                ErrorKind::ConnectionError,
                format!("malformed tools/call response: {}", e),
            ),
        }
    }

    /// Close the session and its transport.
    pub async fn close(mut self) -> ClientResult<()> {
        debug!("Closing session");
        self.transport.close().await
    }

    async fn request(&mut self, method: &str, params: Option<Value>) -> ClientResult<Value> {
        self.next_id += 1;
        let request = JsonRpcRequest::new(self.next_id, method, params);

        let timeout = self.config.timeout;
        tokio::time::timeout(timeout, self.exchange(request))
            .await
            .map_err(|_| ClientError::Timeout)?
    }

    async fn exchange(&mut self, request: JsonRpcRequest) -> ClientResult<Value> {
        let id = request.id.clone().unwrap_or(Value::Null);
        self.transport.send(&request).await?;

        loop {
            let response = self.transport.receive().await?;
            if response.id != id {
                // Late reply to an earlier request that timed out
                warn!(expected = %id, received = %response.id, "Discarding stale response");
                continue;
            }

            if let Some(error) = response.error {
                return Err(ClientError::Rpc {
                    code: error.code,
                    message: error.message,
                });
            }
            return response.result.ok_or_else(|| {
                ClientError::Protocol("response has neither result nor error".to_string())
            });
        }
    }
}
