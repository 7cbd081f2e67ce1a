// Sales tools: read-only reports over the sales store

use super::registry::{RegistryError, ToolError, ToolHandler, ToolRegistry};
use super::schema::{Arguments, ParamSpec, ParamType, ToolDescriptor};
use chrono::NaiveDate;
use salesdesk_core::storage::{SalesQuery, SalesStore};
use salesdesk_core::{CustomerId, Record, ShopId};
use serde::Deserialize;
use std::sync::Arc;

pub const TOP_SELLING_PRODUCTS: &str = "GetTopSellingProducts";
pub const CUSTOMER_ORDERS: &str = "GetCustomerOrders";
pub const SHOP_PERFORMANCE: &str = "GetShopPerformance";

/// Register every sales tool against `store`
pub fn register_sales_tools(
    registry: &mut ToolRegistry,
    store: Arc<dyn SalesStore>,
) -> Result<(), RegistryError> {
    registry.register(
        TopSellingProductsTool::descriptor(),
        Arc::new(TopSellingProductsTool::new(store.clone())),
    )?;
    registry.register(
        CustomerOrdersTool::descriptor(),
        Arc::new(CustomerOrdersTool::new(store.clone())),
    )?;
    registry.register(
        ShopPerformanceTool::descriptor(),
        Arc::new(ShopPerformanceTool::new(store)),
    )?;
    Ok(())
}

/// Store reads are blocking; the read transaction is released when the task ends
async fn run_query(store: Arc<dyn SalesStore>, query: SalesQuery) -> Result<Vec<Record>, ToolError> {
    let operation = query.operation_id();
    let records = tokio::task::spawn_blocking(move || store.query(&query))
        .await
        .map_err(|e| ToolError::Internal(format!("{} query task failed: {}", operation, e)))??;
    Ok(records)
}

/// Top N selling products of a shop
pub struct TopSellingProductsTool {
    store: Arc<dyn SalesStore>,
}

impl TopSellingProductsTool {
    pub fn new(store: Arc<dyn SalesStore>) -> Self {
        Self { store }
    }

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(
            TOP_SELLING_PRODUCTS,
            "Returns the top N selling products for a given shop, with category and quantity sold",
        )
        .param(
            ParamSpec::required("shop_id", ParamType::Integer, "The ID of the shop to query")
                .with_minimum(1),
        )
        .param(
            ParamSpec::optional("limit", ParamType::Integer, "Number of top products to return")
                .with_default(5)
                .with_minimum(0),
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TopSellingArgs {
    shop_id: u64,
    limit: usize,
}

#[async_trait::async_trait]
impl ToolHandler for TopSellingProductsTool {
    async fn call(&self, arguments: Arguments) -> Result<Vec<Record>, ToolError> {
        let args: TopSellingArgs = arguments.decode()?;
        run_query(
            self.store.clone(),
            SalesQuery::TopSellingProducts {
                shop_id: ShopId(args.shop_id),
                limit: args.limit,
            },
        )
        .await
    }
}

/// Order history of a customer
pub struct CustomerOrdersTool {
    store: Arc<dyn SalesStore>,
}

impl CustomerOrdersTool {
    pub fn new(store: Arc<dyn SalesStore>) -> Self {
        Self { store }
    }

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(
            CUSTOMER_ORDERS,
            "Returns order history for a specific customer, newest first, with an optional date range",
        )
        .param(
            ParamSpec::required("customer_id", ParamType::Integer, "ID of the customer whose orders to retrieve")
                .with_minimum(1),
        )
        .param(ParamSpec::optional(
            "start_date",
            ParamType::Date,
            "Only orders on or after this date (YYYY-MM-DD)",
        ))
        .param(ParamSpec::optional(
            "end_date",
            ParamType::Date,
            "Only orders on or before this date (YYYY-MM-DD)",
        ))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CustomerOrdersArgs {
    customer_id: u64,
    #[serde(default)]
    start_date: Option<NaiveDate>,
    #[serde(default)]
    end_date: Option<NaiveDate>,
}

#[async_trait::async_trait]
impl ToolHandler for CustomerOrdersTool {
    async fn call(&self, arguments: Arguments) -> Result<Vec<Record>, ToolError> {
        let args: CustomerOrdersArgs = arguments.decode()?;
        run_query(
            self.store.clone(),
            SalesQuery::CustomerOrders {
                customer_id: CustomerId(args.customer_id),
                start_date: args.start_date,
                end_date: args.end_date,
            },
        )
        .await
    }
}

/// Performance summary of a shop
pub struct ShopPerformanceTool {
    store: Arc<dyn SalesStore>,
}

impl ShopPerformanceTool {
    pub fn new(store: Arc<dyn SalesStore>) -> Self {
        Self { store }
    }

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(
            SHOP_PERFORMANCE,
            "Returns performance metrics for a specific shop: customers, items sold, revenue and top category",
        )
        .param(
            ParamSpec::required("shop_id", ParamType::Integer, "ID of the shop to analyze")
                .with_minimum(1),
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ShopPerformanceArgs {
    shop_id: u64,
}

#[async_trait::async_trait]
impl ToolHandler for ShopPerformanceTool {
    async fn call(&self, arguments: Arguments) -> Result<Vec<Record>, ToolError> {
        let args: ShopPerformanceArgs = arguments.decode()?;
        run_query(
            self.store.clone(),
            SalesQuery::ShopPerformance {
                shop_id: ShopId(args.shop_id),
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salesdesk_core::storage::RedbSalesStore;
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> (TempDir, Arc<RedbSalesStore>) {
        let temp_dir = TempDir::new().unwrap();
        let store = RedbSalesStore::new(temp_dir.path().join("sales.redb")).unwrap();
        store
            .write(|w| {
                let shop = w.insert_shop("Acme Corp", "Springfield")?;
                let customer = w.insert_customer(shop, "Alice", "alice@example.com", "North")?;
                let lamp = w.insert_product(shop, "Lamp", "Furniture", 1500)?;
                w.insert_order(
                    shop,
                    customer,
                    lamp,
                    2,
                    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                )?;
                Ok(())
            })
            .unwrap();
        (temp_dir, Arc::new(store))
    }

    fn registry(store: Arc<RedbSalesStore>) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        register_sales_tools(&mut registry, store).unwrap();
        registry
    }

    async fn call(registry: &ToolRegistry, tool: &str, params: serde_json::Value) -> Vec<Record> {
        let arguments = registry
            .describe(tool)
            .unwrap()
            .validate(params.as_object().unwrap())
            .unwrap();
        registry.resolve(tool).unwrap().call(arguments).await.unwrap()
    }

    #[test]
    fn test_tools_registered_in_order() {
        let (_dir, store) = store();
        let registry = registry(store);

        let names: Vec<&str> = registry.list_all().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec![TOP_SELLING_PRODUCTS, CUSTOMER_ORDERS, SHOP_PERFORMANCE]);
    }

    #[tokio::test]
    async fn test_required_params_are_sufficient_for_every_tool() {
        let (_dir, store) = store();
        let registry = registry(store);

        for descriptor in registry.list_all() {
            let mut params = serde_json::Map::new();
            for name in descriptor.required_params() {
                params.insert(name.to_string(), json!(1));
            }

            let arguments = descriptor.validate(&params).unwrap();
            let handler = registry.resolve(&descriptor.name).unwrap();
            assert!(
                handler.call(arguments).await.is_ok(),
                "{} failed with only its required parameters",
                descriptor.name
            );
        }
    }

    #[tokio::test]
    async fn test_top_selling_products_tool() {
        let (_dir, store) = store();
        let registry = registry(store);

        let records = call(&registry, TOP_SELLING_PRODUCTS, json!({"shop_id": 1})).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["product"], "Lamp");
        assert_eq!(records[0]["quantity_sold"], 2);
        assert_eq!(records[0]["shop_id"], 1);
    }

    #[tokio::test]
    async fn test_customer_orders_tool_with_range() {
        let (_dir, store) = store();
        let registry = registry(store);

        let records = call(
            &registry,
            CUSTOMER_ORDERS,
            json!({"customer_id": 1, "start_date": "2024-05-01", "end_date": "2024-05-01"}),
        )
        .await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["date"], "2024-05-01");
        assert_eq!(records[0]["shop"], "Acme Corp");

        let records = call(
            &registry,
            CUSTOMER_ORDERS,
            json!({"customer_id": 1, "start_date": "2024-05-02"}),
        )
        .await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_shop_performance_tool() {
        let (_dir, store) = store();
        let registry = registry(store);

        let records = call(&registry, SHOP_PERFORMANCE, json!({"shop_id": 1})).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["total_revenue"], 30.0);
        assert_eq!(records[0]["top_category"], "Furniture");
    }

    #[tokio::test]
    async fn test_unknown_shop_is_a_store_error() {
        let (_dir, store) = store();
        let registry = registry(store);

        let arguments = registry
            .describe(SHOP_PERFORMANCE)
            .unwrap()
            .validate(json!({"shop_id": 9}).as_object().unwrap())
            .unwrap();
        let err = registry
            .resolve(SHOP_PERFORMANCE)
            .unwrap()
            .call(arguments)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Store(_)));
        assert_eq!(err.to_string(), "shop 9 not found");
    }
}
