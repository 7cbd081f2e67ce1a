//! Rule-based sales agent.
//!
//! Connects to a tool server, answers a few canned questions with the keyword
//! front end, and prints the rendered results.
//!
//! Run with: cargo run --example sales_agent [endpoint]
//!
//! The endpoint defaults to spawning `salesdesk-mcp`; `tcp://127.0.0.1:7000`
//! or `http://127.0.0.1:8080` connect to a running server instead.

use salesdesk_sdk::agent::{parse_query, render, EXAMPLE_QUERIES};
use salesdesk_sdk::{ClientResult, Endpoint, ToolClient};
use std::time::Duration;

const QUERIES: &[&str] = &[
    "What are the top 3 products in shop 1?",
    "Show me orders for customer 5",
    "List the best selling products in shop 2",
    "What did customer 3 purchase?",
    "Show performance for shop 2",
];

#[tokio::main]
async fn main() -> ClientResult<()> {
    // Logs go to stderr so they don't interleave with the answers
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let endpoint: Endpoint = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("SALESDESK_ENDPOINT").ok())
        .unwrap_or_else(|| "salesdesk-mcp".to_string())
        .parse()?;

    let client = ToolClient::builder()
        .client_name("sales-agent")
        .timeout(Duration::from_secs(10))
        .build()?;

    let mut session = client.connect(&endpoint).await?;
    println!(
        "Connected to {} {}",
        session.server_info().name,
        session.server_info().version
    );

    for tool in session.list_tools().await? {
        println!("  - {}: {}", tool.name, tool.description);
    }

    for query in QUERIES {
        println!("\nQuery: {}", query);

        let Some(call) = parse_query(query) else {
            println!("I couldn't understand your request. Try these formats:");
            for example in EXAMPLE_QUERIES {
                println!("- '{}'", example);
            }
            continue;
        };

        println!("Using tool: {} with params: {}", call.tool, serde_json::Value::Object(call.params.clone()));
        let result = session.invoke(&call.tool, call.params).await;

        println!("=== Results ===");
        println!("{}", render(&call.tool, &result));
    }

    session.close().await
}
