use super::error::StoreResult;
use crate::types::{CustomerId, Record, ShopId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A fixed, parameterized read against the sales store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum SalesQuery {
    /// Products of a shop by units sold, highest first
    TopSellingProducts { shop_id: ShopId, limit: usize },
    /// Order history of a customer, newest first, optionally bounded by date (inclusive)
    CustomerOrders {
        customer_id: CustomerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_date: Option<NaiveDate>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end_date: Option<NaiveDate>,
    },
    /// Aggregate figures for one shop, returned as a single record
    ShopPerformance { shop_id: ShopId },
}

impl SalesQuery {
    pub fn operation_id(&self) -> &'static str {
        match self {
            Self::TopSellingProducts { .. } => "top_selling_products",
            Self::CustomerOrders { .. } => "customer_orders",
            Self::ShopPerformance { .. } => "shop_performance",
        }
    }
}

/// Read access to the sales store
pub trait SalesStore: Send + Sync {
    /// Run a query and return its rows in the operation's defined order
    fn query(&self, query: &SalesQuery) -> StoreResult<Vec<Record>>;
}

/// Flatten a serializable row into a record
pub(crate) fn to_record<T: Serialize>(row: &T) -> StoreResult<Record> {
    match serde_json::to_value(row)? {
        serde_json::Value::Object(map) => Ok(map),
        other => {
            let mut map = Record::new();
            map.insert("value".to_string(), other);
            Ok(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_wire_shape() {
        let query = SalesQuery::TopSellingProducts {
            shop_id: ShopId(1),
            limit: 3,
        };
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"operation": "top_selling_products", "shop_id": 1, "limit": 3})
        );
        assert_eq!(query.operation_id(), "top_selling_products");
    }

    #[test]
    fn test_customer_orders_omits_open_bounds() {
        let query = SalesQuery::CustomerOrders {
            customer_id: CustomerId(5),
            start_date: None,
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31),
        };
        let value = serde_json::to_value(&query).unwrap();
        assert!(value.get("start_date").is_none());
        assert_eq!(value["end_date"], "2024-01-31");
    }
}
