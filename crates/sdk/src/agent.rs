//! Keyword front end and text rendering for the sales tools.
//!
//! Both are pure functions: [`parse_query`] turns a free-text question into a
//! [`ToolCall`], and [`render`] turns an [`InvocationResult`] into text.

use salesdesk_core::Record;
use salesdesk_mcp::protocol::InvocationResult;
use salesdesk_mcp::tools::{CUSTOMER_ORDERS, SHOP_PERFORMANCE, TOP_SELLING_PRODUCTS};
use serde_json::{Map, Value};
use std::fmt::Write;

const TOP_SELLING_KEYWORDS: &[&str] = &["top", "best", "selling", "products", "items"];
const ORDER_KEYWORDS: &[&str] = &["orders", "purchases", "bought", "customer"];
const PERFORMANCE_KEYWORDS: &[&str] = &["performance", "revenue", "stats", "summary"];

const DEFAULT_SHOP_ID: u64 = 1;
const DEFAULT_CUSTOMER_ID: u64 = 1;
const DEFAULT_LIMIT: u64 = 5;

/// Example questions the front end understands
pub const EXAMPLE_QUERIES: &[&str] = &[
    "Show top 5 products in shop 3",
    "List orders for customer 10",
    "Show performance for shop 2",
];

/// Tool name plus parameters, ready for `ToolSession::invoke`
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub tool: String,
    pub params: Map<String, Value>,
}

impl ToolCall {
    fn new(tool: &str, params: impl IntoIterator<Item = (&'static str, u64)>) -> Self {
        Self {
            tool: tool.to_string(),
            params: params
                .into_iter()
                .map(|(name, value)| (name.to_string(), Value::from(value)))
                .collect(),
        }
    }
}

/// Map a free-text question onto a sales tool, or `None` if no rule matches.
pub fn parse_query(text: &str) -> Option<ToolCall> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| !word.is_empty())
        .collect();

    let mentions = |keywords: &[&str]| keywords.iter().any(|keyword| lower.contains(keyword));
    let number_after = |keywords: &[&str]| {
        words
            .windows(2)
            .filter(|pair| keywords.contains(&pair[0]))
            .find_map(|pair| pair[1].parse::<u64>().ok())
    };
    let shop_id = || number_after(&["shop", "store"]).unwrap_or(DEFAULT_SHOP_ID);

    if mentions(TOP_SELLING_KEYWORDS) {
        let limit = number_after(&["top"]).unwrap_or(DEFAULT_LIMIT);
        Some(ToolCall::new(
            TOP_SELLING_PRODUCTS,
            [("shop_id", shop_id()), ("limit", limit)],
        ))
    } else if mentions(ORDER_KEYWORDS) {
        let customer_id = number_after(&["customer"]).unwrap_or(DEFAULT_CUSTOMER_ID);
        Some(ToolCall::new(CUSTOMER_ORDERS, [("customer_id", customer_id)]))
    } else if mentions(PERFORMANCE_KEYWORDS) {
        Some(ToolCall::new(SHOP_PERFORMANCE, [("shop_id", shop_id())]))
    } else {
        None
    }
}

/// Render a result for display.
pub fn render(tool: &str, result: &InvocationResult) -> String {
    let payload = match result {
        InvocationResult::Error { error } => {
            return match &error.parameter {
                Some(parameter) => {
                    format!("Error ({}, {}): {}", error.kind, parameter, error.message)
                }
                None => format!("Error ({}): {}", error.kind, error.message),
            };
        }
        InvocationResult::Ok { payload } => payload,
    };

    if payload.is_empty() {
        return "No results found".to_string();
    }

    let lines: Vec<String> = match tool {
        TOP_SELLING_PRODUCTS => payload
            .iter()
            .enumerate()
            .map(|(i, item)| {
                format!(
                    "{}. {} (Category: {}) - Sold: {}",
                    i + 1,
                    field(item, "product"),
                    field(item, "category"),
                    field(item, "quantity_sold")
                )
            })
            .collect(),
        CUSTOMER_ORDERS => payload
            .iter()
            .map(|order| {
                format!(
                    "[{}] {} (Qty: {}) at {}",
                    field(order, "date"),
                    field(order, "product"),
                    field(order, "quantity"),
                    field(order, "shop")
                )
            })
            .collect(),
        SHOP_PERFORMANCE => payload.iter().map(render_performance).collect(),
        _ => payload
            .iter()
            .map(|record| Value::Object(record.clone()).to_string())
            .collect(),
    };

    lines.join("\n")
}

fn render_performance(record: &Record) -> String {
    let mut out = String::new();
    let revenue = record
        .get("total_revenue")
        .and_then(Value::as_f64)
        .unwrap_or_default();

    // Writing to a String cannot fail
    let _ = writeln!(
        out,
        "{} ({})",
        field(record, "shop_name"),
        field(record, "location")
    );
    let _ = writeln!(out, "  Unique customers: {}", field(record, "unique_customers"));
    let _ = writeln!(out, "  Items sold: {}", field(record, "total_items_sold"));
    let _ = writeln!(out, "  Revenue: {:.2}", revenue);
    let _ = write!(
        out,
        "  Top category: {} ({} sold)",
        field(record, "top_category"),
        field(record, "top_category_sales")
    );
    out
}

fn field(record: &Record, name: &str) -> String {
    match record.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "-".to_string(),
        Some(other) => other.to_string(),
    }
}
