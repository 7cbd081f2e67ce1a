// MCP server: resolves, validates and dispatches tool invocations
// Sessions are line-delimited JSON-RPC over stdio or TCP

use crate::protocol::{
    CallToolParams, CallToolResult, ErrorKind, InitializeParams, InitializeResult, InvocationError,
    InvocationRequest, InvocationResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult, ServerCapabilities, ServerInfo, ToolsCapability, PROTOCOL_VERSION,
};
use crate::tools::{ToolError, ToolRegistry};
use anyhow::Result;
use bytes::{Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::codec::{
    AnyDelimiterCodec, AnyDelimiterCodecError, Decoder, FramedRead, FramedWrite, LinesCodec,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

/// Longest accepted request line
const MAX_LINE_LENGTH: usize = 1024 * 1024;

pub struct McpServer {
    registry: Arc<ToolRegistry>,
    info: ServerInfo,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            info: ServerInfo {
                name: "salesdesk".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Resolve, validate and run one invocation.
    ///
    /// Every failure comes back as an [`InvocationResult::Error`]; nothing
    /// reaches the store unless the tool exists and its parameters validate.
    pub async fn handle_invocation(&self, request: InvocationRequest) -> InvocationResult {
        let tool = request.tool.as_str();

        let descriptor = match self.registry.describe(tool) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                warn!(tool = %tool, "Invocation of unknown tool");
                return InvocationResult::failure(ErrorKind::ToolNotFound, e.to_string());
            }
        };

        let arguments = match descriptor.validate(&request.params) {
            Ok(arguments) => arguments,
            Err(e) => {
                warn!(tool = %tool, error = %e, "Rejected invocation parameters");
                return InvocationError::new(ErrorKind::InvalidParameters, e.to_string())
                    .with_parameter(e.parameter())
                    .into();
            }
        };

        let handler = match self.registry.resolve(tool) {
            Ok(handler) => handler,
            Err(e) => return InvocationResult::failure(ErrorKind::ToolNotFound, e.to_string()),
        };

        debug!(tool = %tool, "Dispatching invocation");
        match handler.call(arguments).await {
            Ok(records) => {
                debug!(tool = %tool, rows = records.len(), "Invocation succeeded");
                InvocationResult::success(records)
            }
            Err(ToolError::InvalidArguments(e)) => {
                warn!(tool = %tool, error = %e, "Handler rejected validated arguments");
                InvocationResult::failure(ErrorKind::InvalidParameters, e.to_string())
            }
            Err(e) => {
                error!(tool = %tool, error = %e, "Tool execution failed");
                InvocationResult::failure(ErrorKind::ExecutionError, e.to_string())
            }
        }
    }

    /// Handle a JSON-RPC request; notifications produce no response
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id.unwrap_or(Value::Null),
                JsonRpcError::invalid_request("jsonrpc must be \"2.0\""),
            ));
        }

        let Some(id) = request.id else {
            debug!(method = %request.method, "Received notification");
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => {
                self.log_client(request.params);
                JsonRpcResponse::from_result(id, &self.initialize_result())
            }
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => JsonRpcResponse::from_result(
                id,
                &ListToolsResult {
                    tools: self.registry.list_schemas(),
                },
            ),
            "tools/call" => match parse_call_params(request.params) {
                Ok(invocation) => {
                    let result = self.handle_invocation(invocation).await;
                    JsonRpcResponse::from_result(id, &CallToolResult::from(result))
                }
                Err(e) => JsonRpcResponse::error(id, e),
            },
            other => {
                debug!(method = %other, "Unknown method");
                JsonRpcResponse::error(id, JsonRpcError::method_not_found(other))
            }
        };

        Some(response)
    }

    /// Handle one raw message line, returning the encoded response if any
    pub async fn handle_message(&self, line: &str) -> Option<String> {
        self.handle_bytes(line.as_bytes()).await
    }

    /// Like [`handle_message`](Self::handle_message), for a frame that may
    /// not be valid UTF-8; such a frame is a parse error
    pub async fn handle_bytes(&self, line: &[u8]) -> Option<String> {
        let value: Value = match serde_json::from_slice(line) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Invalid JSON-RPC message");
                return encode(&JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error()));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Malformed JSON-RPC request");
                return encode(&JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_request(format!("Invalid Request: {}", e)),
                ));
            }
        };

        let response = self.handle_request(request).await?;
        encode(&response)
    }

    async fn handle_frame(&self, frame: Frame) -> Option<String> {
        match frame {
            Frame::Line(line) if line.iter().all(u8::is_ascii_whitespace) => None,
            Frame::Line(line) => self.handle_bytes(&line).await,
            Frame::Oversized => {
                warn!(max = MAX_LINE_LENGTH, "Discarded oversized message");
                encode(&JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error()))
            }
        }
    }

    /// Serve one session until its input ends.
    ///
    /// Requests are handled one at a time in arrival order; everything
    /// received before the input ends is answered. If reading fails or a
    /// response cannot be written, the peer is gone and the request in
    /// flight is abandoned.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send,
    {
        let span = tracing::info_span!("session", id = %uuid::Uuid::new_v4());
        self.run_session(reader, writer).instrument(span).await
    }

    async fn run_session<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send,
    {
        info!("Session opened");

        let peer_gone = CancellationToken::new();
        let (frame_tx, mut frame_rx) = mpsc::channel::<Frame>(32);

        let reader_gone = peer_gone.clone();
        let reader_task = tokio::spawn(
            async move {
                let mut frames = FramedRead::new(reader, RequestCodec::new());
                while let Some(frame) = frames.next().await {
                    match frame {
                        Ok(frame) => {
                            if frame_tx.send(frame).await.is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "Failed to read from peer");
                            reader_gone.cancel();
                            return;
                        }
                    }
                }
                debug!("Session input ended");
            }
            .in_current_span(),
        );

        let mut sink = FramedWrite::new(writer, LinesCodec::new());

        // Drains queued frames after EOF; the channel closes once the reader is done
        while let Some(frame) = frame_rx.recv().await {
            let response = tokio::select! {
                biased;
                _ = peer_gone.cancelled() => {
                    info!("Peer went away, abandoning in-flight request");
                    break;
                }
                response = self.handle_frame(frame) => response,
            };

            if let Some(response) = response {
                if let Err(e) = sink.send(response).await {
                    warn!(error = %e, "Failed to write response");
                    peer_gone.cancel();
                    break;
                }
            }
        }

        reader_task.abort();
        info!("Session closed");
        Ok(())
    }

    /// Serve a single session on stdin/stdout
    pub async fn serve_stdio(&self) -> Result<()> {
        info!("MCP stdio transport ready");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Accept TCP connections forever, one concurrent session per connection
    pub async fn serve_tcp(self: Arc<Self>, listener: TcpListener) -> Result<()> {
        info!(addr = %listener.local_addr()?, "MCP TCP transport ready");

        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                    continue;
                }
            };

            let server = self.clone();
            tokio::spawn(async move {
                debug!(%peer, "Accepted connection");
                let (reader, writer) = stream.into_split();
                if let Err(e) = server.serve(reader, writer).await {
                    warn!(%peer, error = %e, "Session ended with error");
                }
            });
        }
    }

    fn initialize_result(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
                experimental: serde_json::json!({}),
            },
            server_info: self.info.clone(),
        }
    }

    fn log_client(&self, params: Option<Value>) {
        match params.map(serde_json::from_value::<InitializeParams>) {
            Some(Ok(params)) => info!(
                client = %params.client_info.name,
                version = %params.client_info.version,
                protocol = %params.protocol_version,
                "Client initialized"
            ),
            Some(Err(e)) => debug!(error = %e, "Unrecognized initialize params"),
            None => debug!("Client initialized without params"),
        }
    }
}

fn parse_call_params(params: Option<Value>) -> Result<InvocationRequest, JsonRpcError> {
    let params = params.ok_or_else(|| JsonRpcError::invalid_params("Missing tools/call params"))?;
    let call: CallToolParams = serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)))?;

    let arguments = match call.arguments {
        None | Some(Value::Null) => serde_json::Map::new(),
        Some(Value::Object(arguments)) => arguments,
        Some(_) => return Err(JsonRpcError::invalid_params("arguments must be an object")),
    };

    Ok(InvocationRequest::new(call.name, arguments))
}

fn encode(response: &JsonRpcResponse) -> Option<String> {
    match serde_json::to_string(response) {
        Ok(line) => Some(line),
        Err(e) => {
            error!(error = %e, "Failed to encode response");
            None
        }
    }
}

/// One newline-delimited frame of session input
enum Frame {
    Line(Bytes),
    /// A line longer than `MAX_LINE_LENGTH`; the codec skips to the next newline
    Oversized,
}

/// Splits session input on newlines without requiring UTF-8, so a bad
/// line becomes a frame instead of a decode error ending the stream
struct RequestCodec {
    inner: AnyDelimiterCodec,
}

impl RequestCodec {
    fn new() -> Self {
        Self {
            inner: AnyDelimiterCodec::new_with_max_length(
                b"\n".to_vec(),
                b"\n".to_vec(),
                MAX_LINE_LENGTH,
            ),
        }
    }

    fn frame(result: Result<Option<Bytes>, AnyDelimiterCodecError>) -> io::Result<Option<Frame>> {
        match result {
            Ok(line) => Ok(line.map(Frame::Line)),
            Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => Ok(Some(Frame::Oversized)),
            Err(AnyDelimiterCodecError::Io(e)) => Err(e),
        }
    }
}

impl Decoder for RequestCodec {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<Frame>> {
        Self::frame(self.inner.decode(src))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> io::Result<Option<Frame>> {
        Self::frame(self.inner.decode_eof(src))
    }
}
