//! Line-delimited JSON-RPC over a child process or a TCP stream.

use super::Transport;
use crate::error::{ClientError, ClientResult};
use futures_util::{SinkExt, StreamExt};
use salesdesk_mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, warn};

type BoxedReader = Box<dyn AsyncRead + Unpin + Send>;
type BoxedWriter = Box<dyn AsyncWrite + Unpin + Send>;

/// Longest accepted response line
const MAX_LINE_LENGTH: usize = 8 * 1024 * 1024;

/// Grace period for a child process to exit after its stdin closes
const CHILD_EXIT_GRACE: Duration = Duration::from_secs(2);

/// Newline-framed transport over any byte stream pair.
pub struct LineTransport {
    reader: FramedRead<BoxedReader, LinesCodec>,
    writer: FramedWrite<BoxedWriter, LinesCodec>,
    child: Option<Child>,
}

impl LineTransport {
    /// Frame an existing reader/writer pair.
    pub fn new<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self {
            reader: FramedRead::new(
                Box::new(reader) as BoxedReader,
                LinesCodec::new_with_max_length(MAX_LINE_LENGTH),
            ),
            writer: FramedWrite::new(Box::new(writer) as BoxedWriter, LinesCodec::new()),
            child: None,
        }
    }

    /// Spawn a server process and talk to it over its stdin/stdout.
    ///
    /// The process is killed when the transport is dropped.
    pub fn spawn(program: &str, args: &[String]) -> ClientResult<Self> {
        debug!(program, ?args, "Spawning tool server");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ClientError::Protocol("child stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClientError::Protocol("child stdout unavailable".to_string()))?;

        let mut transport = Self::new(stdout, stdin);
        transport.child = Some(child);
        Ok(transport)
    }

    /// Connect to a server listening on `addr` (`host:port`).
    pub async fn connect_tcp(addr: &str) -> ClientResult<Self> {
        debug!(addr, "Connecting to tool server");
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let (reader, writer) = stream.into_split();
        Ok(Self::new(reader, writer))
    }
}

#[async_trait::async_trait]
impl Transport for LineTransport {
    async fn send(&mut self, message: &JsonRpcRequest) -> ClientResult<()> {
        let line = serde_json::to_string(message)?;
        self.writer
            .send(line)
            .await
            .map_err(|e| ClientError::Protocol(format!("failed to write message: {}", e)))
    }

    async fn receive(&mut self) -> ClientResult<JsonRpcResponse> {
        loop {
            match self.reader.next().await {
                None => return Err(ClientError::Closed),
                Some(Err(e)) => {
                    return Err(ClientError::Protocol(format!("failed to read message: {}", e)))
                }
                Some(Ok(line)) if line.trim().is_empty() => continue,
                Some(Ok(line)) => return Ok(serde_json::from_str(&line)?),
            }
        }
    }

    async fn close(&mut self) -> ClientResult<()> {
        if let Err(e) = SinkExt::<String>::close(&mut self.writer).await {
            debug!(error = %e, "Failed to close writer");
        }

        if let Some(mut child) = self.child.take() {
            match tokio::time::timeout(CHILD_EXIT_GRACE, child.wait()).await {
                Ok(status) => {
                    let status = status?;
                    debug!(%status, "Tool server exited");
                }
                Err(_) => {
                    warn!("Tool server did not exit after stdin closed, killing it");
                    child.kill().await?;
                }
            }
        }

        Ok(())
    }
}
