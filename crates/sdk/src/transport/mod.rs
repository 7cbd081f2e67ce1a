//! Transport layer for the salesdesk SDK.
//!
//! A transport moves JSON-RPC messages between a session and a server. Line
//! transports (child process, TCP) carry one message per line; the HTTP
//! transport posts each message and queues the reply.

pub mod http;
pub mod line;

pub use http::HttpTransport;
pub use line::LineTransport;

use crate::error::ClientResult;
use salesdesk_mcp::protocol::{JsonRpcRequest, JsonRpcResponse};

/// Message channel between a session and a tool server.
#[async_trait::async_trait]
pub trait Transport: Send {
    /// Send one request or notification.
    async fn send(&mut self, message: &JsonRpcRequest) -> ClientResult<()>;

    /// Wait for the next response from the server.
    async fn receive(&mut self) -> ClientResult<JsonRpcResponse>;

    /// Tear down the underlying connection.
    async fn close(&mut self) -> ClientResult<()>;
}
