//! Error types for the salesdesk SDK.

use salesdesk_mcp::protocol::{ErrorKind, InvocationError, InvocationResult};
use salesdesk_mcp::tools::SchemaError;

/// Result type for SDK operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Error types that can occur when talking to a tool server.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP endpoint answered with a non-success status.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Reading from or writing to the transport failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server answered with a JSON-RPC error.
    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i32, message: String },

    /// Server broke the protocol.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Server sent a tool schema the client cannot read.
    #[error("Invalid tool schema: {0}")]
    Schema(#[from] SchemaError),

    /// The server closed the connection.
    #[error("Connection closed by server")]
    Closed,

    /// No response within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    /// Invocation error kind this failure surfaces as.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout => ErrorKind::Timeout,
            Self::Http(e) if e.is_timeout() => ErrorKind::Timeout,
            _ => ErrorKind::ConnectionError,
        }
    }

    /// Convert into the failed result `invoke` hands back.
    pub fn into_invocation_result(self) -> InvocationResult {
        InvocationError::new(self.kind(), self.to_string()).into()
    }
}
