// Standalone MCP server binary
// Speaks MCP over stdio, or over TCP when SALESDESK_LISTEN is set

use anyhow::{Context, Result};
use salesdesk_core::storage::RedbSalesStore;
use salesdesk_mcp::server::McpServer;
use salesdesk_mcp::tools::{register_sales_tools, ToolRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Salesdesk MCP Server starting...");

    // Set up storage (use ./data by default)
    let data_dir = std::env::var("SALESDESK_DATA_DIR").unwrap_or_else(|_| "./data".to_string());
    let store_path = PathBuf::from(data_dir).join("sales.redb");

    let store = Arc::new(
        RedbSalesStore::new(store_path.clone())
            .with_context(|| format!("failed to open sales store at {}", store_path.display()))?,
    );
    if store.shop_count()? == 0 {
        tracing::warn!(
            path = %store_path.display(),
            "Sales store is empty; run `salesdesk seed` to populate it"
        );
    }

    let mut registry = ToolRegistry::new();
    register_sales_tools(&mut registry, store)?;
    tracing::info!("Registered {} tools", registry.len());

    let server = McpServer::new(registry);

    match std::env::var("SALESDESK_LISTEN") {
        Ok(addr) => {
            let listener = TcpListener::bind(&addr)
                .await
                .with_context(|| format!("failed to bind {}", addr))?;
            Arc::new(server).serve_tcp(listener).await
        }
        Err(_) => server.serve_stdio().await,
    }
}
