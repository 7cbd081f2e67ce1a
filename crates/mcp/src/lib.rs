// MCP (Model Context Protocol) server exposing the sales tools
// Tools are registered explicitly at startup and served over stdio or TCP

pub mod protocol;
pub mod server;
pub mod tools;

pub use protocol::{ErrorKind, InvocationError, InvocationRequest, InvocationResult};
pub use server::McpServer;
