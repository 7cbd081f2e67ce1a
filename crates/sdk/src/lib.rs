//! # Salesdesk SDK
//!
//! Rust client for salesdesk tool servers.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use salesdesk_sdk::{agent, ClientResult, Endpoint, ToolClient};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> ClientResult<()> {
//!     let client = ToolClient::builder()
//!         .timeout(Duration::from_secs(10))
//!         .build()?;
//!
//!     // Spawn the stdio server; `tcp://host:port` and `http://...` also work
//!     let endpoint: Endpoint = "salesdesk-mcp".parse()?;
//!     let mut session = client.connect(&endpoint).await?;
//!
//!     for tool in session.list_tools().await? {
//!         println!("{}: {}", tool.name, tool.description);
//!     }
//!
//!     if let Some(call) = agent::parse_query("What are the top 3 products in shop 1?") {
//!         let result = session.invoke(&call.tool, call.params).await;
//!         println!("{}", agent::render(&call.tool, &result));
//!     }
//!
//!     session.close().await
//! }
//! ```

pub mod agent;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;

// Re-export main client
pub use client::{Endpoint, ToolClient, ToolClientBuilder, ToolSession};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};

// Re-export protocol types for convenience
pub use salesdesk_mcp::protocol::{ErrorKind, InvocationError, InvocationRequest, InvocationResult};
pub use salesdesk_mcp::tools::{ParamSpec, ParamType, ToolDescriptor};
