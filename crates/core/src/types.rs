use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of a query result: field name to scalar value
pub type Record = serde_json::Map<String, serde_json::Value>;

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

row_id!(
    /// Unique identifier for a shop
    ShopId
);
row_id!(
    /// Unique identifier for a customer
    CustomerId
);
row_id!(
    /// Unique identifier for a product
    ProductId
);
row_id!(
    /// Unique identifier for an order
    OrderId
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    pub id: ShopId,
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub shop_id: ShopId,
    pub name: String,
    pub email: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub shop_id: ShopId,
    pub name: String,
    pub category: String,
    /// Unit price in cents
    pub price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub shop_id: ShopId,
    pub customer_id: CustomerId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub order_date: NaiveDate,
}

/// A product ranked by units sold within one shop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopProduct {
    pub product_id: ProductId,
    pub product: String,
    pub category: String,
    pub quantity_sold: u64,
    pub shop_id: ShopId,
}

/// One line of a customer's order history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerOrder {
    pub order_id: OrderId,
    pub product: String,
    pub category: String,
    pub quantity: u32,
    pub date: NaiveDate,
    pub shop: String,
}

/// Aggregate sales figures for a shop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopPerformance {
    pub shop_id: ShopId,
    pub shop_name: String,
    pub location: String,
    pub unique_customers: u64,
    pub total_items_sold: u64,
    pub total_revenue: f64,
    pub top_category: String,
    pub top_category_sales: u64,
}
