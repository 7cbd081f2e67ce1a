use super::error::{StoreError, StoreResult};
use super::query::{to_record, SalesQuery, SalesStore};
use crate::types::{
    Customer, CustomerId, CustomerOrder, Order, OrderId, Product, ProductId, Record, Shop, ShopId,
    ShopPerformance, TopProduct,
};
use chrono::NaiveDate;
use redb::{Database, ReadTransaction, ReadableTable, TableDefinition, WriteTransaction};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

type RowTable = TableDefinition<'static, u64, &'static [u8]>;

const SHOPS_TABLE: RowTable = TableDefinition::new("shops");
const CUSTOMERS_TABLE: RowTable = TableDefinition::new("customers");
const PRODUCTS_TABLE: RowTable = TableDefinition::new("products");
const ORDERS_TABLE: RowTable = TableDefinition::new("orders");

/// Sales store backed by redb, one table per entity keyed by row id
#[derive(Clone)]
pub struct RedbSalesStore {
    db: Arc<Database>,
}

impl RedbSalesStore {
    pub fn new(path: PathBuf) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Unavailable(format!("failed to create store directory: {e}"))
            })?;
        }

        let db = Database::create(&path).map_err(|e| {
            StoreError::Unavailable(format!("failed to open {}: {e}", path.display()))
        })?;

        // Initialize tables
        let write_txn = db.begin_write()?;
        for table in [SHOPS_TABLE, CUSTOMERS_TABLE, PRODUCTS_TABLE, ORDERS_TABLE] {
            write_txn.open_table(table)?;
        }
        write_txn.commit()?;

        tracing::debug!(path = %path.display(), "Opened sales store");
        Ok(Self { db: Arc::new(db) })
    }

    /// Run `f` inside a single write transaction, committing only if it succeeds
    pub fn write<T>(&self, f: impl FnOnce(&SalesWriter<'_>) -> StoreResult<T>) -> StoreResult<T> {
        let txn = self.db.begin_write()?;
        let output = f(&SalesWriter { txn: &txn })?;
        txn.commit()?;
        Ok(output)
    }

    pub fn shop_count(&self) -> StoreResult<u64> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(SHOPS_TABLE)?;
        let count = table.iter()?.count();
        Ok(count as u64)
    }

    pub fn get_shop(&self, shop_id: ShopId) -> StoreResult<Option<Shop>> {
        let txn = self.db.begin_read()?;
        read_one(&txn, SHOPS_TABLE, shop_id.0)
    }

    /// Products of a shop ranked by units sold, ties broken by product id
    pub fn top_selling_products(&self, shop_id: ShopId, limit: usize) -> StoreResult<Vec<TopProduct>> {
        let txn = self.db.begin_read()?;
        let orders: Vec<Order> = read_all(&txn, ORDERS_TABLE)?;

        let mut sold: HashMap<ProductId, u64> = HashMap::new();
        for order in orders.iter().filter(|o| o.shop_id == shop_id) {
            *sold.entry(order.product_id).or_default() += u64::from(order.quantity);
        }

        let mut ranked: Vec<(ProductId, u64)> = sold.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(limit);

        let mut top = Vec::with_capacity(ranked.len());
        for (product_id, quantity_sold) in ranked {
            let product: Product = read_one(&txn, PRODUCTS_TABLE, product_id.0)?
                .ok_or_else(|| StoreError::NotFound(format!("product {product_id}")))?;
            top.push(TopProduct {
                product_id,
                product: product.name,
                category: product.category,
                quantity_sold,
                shop_id,
            });
        }

        Ok(top)
    }

    /// Orders placed by a customer, newest first
    pub fn customer_orders(
        &self,
        customer_id: CustomerId,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> StoreResult<Vec<CustomerOrder>> {
        let txn = self.db.begin_read()?;
        let mut orders: Vec<Order> = read_all::<Order>(&txn, ORDERS_TABLE)?
            .into_iter()
            .filter(|o| o.customer_id == customer_id)
            .filter(|o| start_date.map_or(true, |start| o.order_date >= start))
            .filter(|o| end_date.map_or(true, |end| o.order_date <= end))
            .collect();

        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date).then(b.id.cmp(&a.id)));

        let products: HashMap<ProductId, Product> = read_all::<Product>(&txn, PRODUCTS_TABLE)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        let shops: HashMap<ShopId, Shop> = read_all::<Shop>(&txn, SHOPS_TABLE)?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        orders
            .into_iter()
            .map(|order| {
                let product = products
                    .get(&order.product_id)
                    .ok_or_else(|| StoreError::NotFound(format!("product {}", order.product_id)))?;
                let shop = shops
                    .get(&order.shop_id)
                    .ok_or_else(|| StoreError::NotFound(format!("shop {}", order.shop_id)))?;
                Ok(CustomerOrder {
                    order_id: order.id,
                    product: product.name.clone(),
                    category: product.category.clone(),
                    quantity: order.quantity,
                    date: order.order_date,
                    shop: shop.name.clone(),
                })
            })
            .collect()
    }

    /// Customer, volume and revenue figures for a shop
    pub fn shop_performance(&self, shop_id: ShopId) -> StoreResult<ShopPerformance> {
        let txn = self.db.begin_read()?;
        let shop: Shop = read_one(&txn, SHOPS_TABLE, shop_id.0)?
            .ok_or_else(|| StoreError::NotFound(format!("shop {shop_id}")))?;

        let products: HashMap<ProductId, Product> = read_all::<Product>(&txn, PRODUCTS_TABLE)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut customers = HashSet::new();
        let mut items_sold = 0u64;
        let mut revenue_cents = 0i64;
        let mut by_category: HashMap<String, u64> = HashMap::new();

        for order in read_all::<Order>(&txn, ORDERS_TABLE)?
            .into_iter()
            .filter(|o| o.shop_id == shop_id)
        {
            let product = products
                .get(&order.product_id)
                .ok_or_else(|| StoreError::NotFound(format!("product {}", order.product_id)))?;

            customers.insert(order.customer_id);
            items_sold += u64::from(order.quantity);
            revenue_cents += i64::from(order.quantity) * product.price_cents;
            *by_category.entry(product.category.clone()).or_default() += u64::from(order.quantity);
        }

        let top_category = by_category
            .into_iter()
            .min_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let (top_category, top_category_sales) =
            top_category.unwrap_or_else(|| ("N/A".to_string(), 0));

        Ok(ShopPerformance {
            shop_id,
            shop_name: shop.name,
            location: shop.location,
            unique_customers: customers.len() as u64,
            total_items_sold: items_sold,
            total_revenue: revenue_cents as f64 / 100.0,
            top_category,
            top_category_sales,
        })
    }
}

impl SalesStore for RedbSalesStore {
    fn query(&self, query: &SalesQuery) -> StoreResult<Vec<Record>> {
        let records = match query {
            SalesQuery::TopSellingProducts { shop_id, limit } => self
                .top_selling_products(*shop_id, *limit)?
                .iter()
                .map(to_record)
                .collect::<StoreResult<Vec<_>>>()?,
            SalesQuery::CustomerOrders {
                customer_id,
                start_date,
                end_date,
            } => self
                .customer_orders(*customer_id, *start_date, *end_date)?
                .iter()
                .map(to_record)
                .collect::<StoreResult<Vec<_>>>()?,
            SalesQuery::ShopPerformance { shop_id } => {
                vec![to_record(&self.shop_performance(*shop_id)?)?]
            }
        };

        tracing::debug!(
            operation = query.operation_id(),
            rows = records.len(),
            "Sales query completed"
        );
        Ok(records)
    }
}

/// Inserts rows within one write transaction, assigning sequential ids per table
pub struct SalesWriter<'a> {
    txn: &'a WriteTransaction,
}

impl SalesWriter<'_> {
    pub fn insert_shop(&self, name: impl Into<String>, location: impl Into<String>) -> StoreResult<ShopId> {
        let (name, location) = (name.into(), location.into());
        self.insert_row(SHOPS_TABLE, |id| Shop {
            id: ShopId(id),
            name,
            location,
        })
        .map(ShopId)
    }

    pub fn insert_customer(
        &self,
        shop_id: ShopId,
        name: impl Into<String>,
        email: impl Into<String>,
        region: impl Into<String>,
    ) -> StoreResult<CustomerId> {
        let (name, email, region) = (name.into(), email.into(), region.into());
        self.insert_row(CUSTOMERS_TABLE, |id| Customer {
            id: CustomerId(id),
            shop_id,
            name,
            email,
            region,
        })
        .map(CustomerId)
    }

    pub fn insert_product(
        &self,
        shop_id: ShopId,
        name: impl Into<String>,
        category: impl Into<String>,
        price_cents: i64,
    ) -> StoreResult<ProductId> {
        let (name, category) = (name.into(), category.into());
        self.insert_row(PRODUCTS_TABLE, |id| Product {
            id: ProductId(id),
            shop_id,
            name,
            category,
            price_cents,
        })
        .map(ProductId)
    }

    pub fn insert_order(
        &self,
        shop_id: ShopId,
        customer_id: CustomerId,
        product_id: ProductId,
        quantity: u32,
        order_date: NaiveDate,
    ) -> StoreResult<OrderId> {
        self.insert_row(ORDERS_TABLE, |id| Order {
            id: OrderId(id),
            shop_id,
            customer_id,
            product_id,
            quantity,
            order_date,
        })
        .map(OrderId)
    }

    fn insert_row<T: Serialize>(&self, table: RowTable, build: impl FnOnce(u64) -> T) -> StoreResult<u64> {
        let mut table = self.txn.open_table(table)?;
        let id = match table.last()? {
            Some((key, _)) => key.value() + 1,
            None => 1,
        };

        let value = serde_json::to_vec(&build(id))?;
        table.insert(id, value.as_slice())?;
        Ok(id)
    }
}

fn read_all<T: DeserializeOwned>(txn: &ReadTransaction, table: RowTable) -> StoreResult<Vec<T>> {
    let table = txn.open_table(table)?;

    let mut rows = Vec::new();
    for item in table.iter()? {
        let (_id, value) = item?;
        rows.push(serde_json::from_slice(value.value())?);
    }
    Ok(rows)
}

fn read_one<T: DeserializeOwned>(txn: &ReadTransaction, table: RowTable, id: u64) -> StoreResult<Option<T>> {
    let table = txn.open_table(table)?;
    match table.get(id)? {
        Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
        None => Ok(None),
    }
}
