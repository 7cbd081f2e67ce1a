// Demo data generation for the sales store

use crate::storage::{RedbSalesStore, StoreError, StoreResult};
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const REGIONS: &[&str] = &["North", "South", "East", "West"];
const CATEGORIES: &[&str] = &["Electronics", "Clothing", "Furniture", "Books", "Groceries"];

const COMPANY_WORDS: &[&str] = &[
    "Acme", "Globex", "Initech", "Umbrella", "Stark", "Wayne", "Hooli", "Vandelay", "Soylent",
    "Cyberdyne", "Tyrell", "Wonka",
];
const COMPANY_SUFFIXES: &[&str] = &["Group", "Ltd", "Inc", "and Sons", "Trading", "Partners"];
const CITIES: &[&str] = &[
    "Springfield", "Shelbyville", "Riverton", "Lakeside", "Fairview", "Greenville", "Oakridge",
    "Brookfield", "Maplewood", "Hillcrest",
];
const FIRST_NAMES: &[&str] = &[
    "Alice", "Bob", "Carol", "David", "Erin", "Frank", "Grace", "Heidi", "Ivan", "Judy", "Mallory",
    "Niaj", "Olivia", "Peggy", "Rupert", "Sybil", "Trent", "Victor", "Walter", "Yvonne",
];
const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Lopez",
    "Wilson", "Anderson", "Thomas", "Taylor", "Moore", "Martin",
];
const PRODUCT_WORDS: &[&str] = &[
    "Quantum", "Velvet", "Rapid", "Silent", "Golden", "Nimbus", "Solar", "Arctic", "Crimson",
    "Lunar", "Lamp", "Chair", "Kettle", "Jacket", "Novel", "Speaker", "Blender", "Desk", "Scarf",
    "Atlas",
];

/// How much demo data to generate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    #[serde(default = "default_shops")]
    pub shops: u32,

    #[serde(default = "default_customers_per_shop")]
    pub customers_per_shop: u32,

    #[serde(default = "default_products_per_shop")]
    pub products_per_shop: u32,

    #[serde(default = "default_orders_per_shop")]
    pub orders_per_shop: u32,

    /// Fixed RNG seed for a reproducible data set; random when unset
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_shops() -> u32 {
    5
}

fn default_customers_per_shop() -> u32 {
    100
}

fn default_products_per_shop() -> u32 {
    20
}

fn default_orders_per_shop() -> u32 {
    200
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            shops: default_shops(),
            customers_per_shop: default_customers_per_shop(),
            products_per_shop: default_products_per_shop(),
            orders_per_shop: default_orders_per_shop(),
            seed: None,
        }
    }
}

/// Row counts written by [`seed`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSummary {
    pub shops: u64,
    pub customers: u64,
    pub products: u64,
    pub orders: u64,
}

/// Populate an empty store with shops, customers, products and orders.
///
/// Order dates fall between 1 and 365 days before `today`. Each shop is
/// written in its own transaction.
pub fn seed(store: &RedbSalesStore, config: &SeedConfig, today: NaiveDate) -> StoreResult<SeedSummary> {
    let existing = store.shop_count()?;
    if existing > 0 {
        return Err(StoreError::AlreadySeeded(existing));
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut summary = SeedSummary::default();

    for shop_index in 0..config.shops {
        store.write(|w| {
            let shop_id = w.insert_shop(company_name(&mut rng), pick(&mut rng, CITIES))?;
            summary.shops += 1;

            let mut customer_ids = Vec::with_capacity(config.customers_per_shop as usize);
            for _ in 0..config.customers_per_shop {
                let first = pick(&mut rng, FIRST_NAMES);
                let last = pick(&mut rng, LAST_NAMES);
                // Email uniqueness comes from the running customer count
                let email = format!(
                    "{}.{}{}@example.com",
                    first.to_lowercase(),
                    last.to_lowercase(),
                    summary.customers + 1
                );
                let id = w.insert_customer(
                    shop_id,
                    format!("{first} {last}"),
                    email,
                    pick(&mut rng, REGIONS),
                )?;
                customer_ids.push(id);
                summary.customers += 1;
            }

            let mut product_ids = Vec::with_capacity(config.products_per_shop as usize);
            for _ in 0..config.products_per_shop {
                let name = format!(
                    "{} {}",
                    pick(&mut rng, PRODUCT_WORDS),
                    pick(&mut rng, PRODUCT_WORDS)
                );
                let price_cents = rng.gen_range(100..=10_000);
                let id = w.insert_product(shop_id, name, pick(&mut rng, CATEGORIES), price_cents)?;
                product_ids.push(id);
                summary.products += 1;
            }

            if customer_ids.is_empty() || product_ids.is_empty() {
                return Ok(());
            }

            for _ in 0..config.orders_per_shop {
                let customer_id = customer_ids[rng.gen_range(0..customer_ids.len())];
                let product_id = product_ids[rng.gen_range(0..product_ids.len())];
                let quantity = rng.gen_range(1..=5);
                let order_date = today - Duration::days(rng.gen_range(1..=365));
                w.insert_order(shop_id, customer_id, product_id, quantity, order_date)?;
                summary.orders += 1;
            }

            Ok(())
        })?;

        tracing::info!(shop = shop_index + 1, total = config.shops, "Seeded shop");
    }

    Ok(summary)
}

fn pick(rng: &mut StdRng, words: &[&'static str]) -> &'static str {
    words.choose(rng).copied().unwrap_or_default()
}

fn company_name(rng: &mut StdRng) -> String {
    format!(
        "{} {}",
        pick(rng, COMPANY_WORDS),
        pick(rng, COMPANY_SUFFIXES)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SalesQuery;
    use crate::storage::SalesStore;
    use crate::types::{CustomerId, ShopId};
    use tempfile::TempDir;

    fn small_config(seed: u64) -> SeedConfig {
        SeedConfig {
            shops: 2,
            customers_per_shop: 5,
            products_per_shop: 4,
            orders_per_shop: 12,
            seed: Some(seed),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_seed_counts() {
        let temp_dir = TempDir::new().unwrap();
        let store = RedbSalesStore::new(temp_dir.path().join("sales.redb")).unwrap();

        let summary = seed(&store, &small_config(7), today()).unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                shops: 2,
                customers: 10,
                products: 8,
                orders: 24,
            }
        );
        assert_eq!(store.shop_count().unwrap(), 2);

        let perf = store.shop_performance(ShopId(1)).unwrap();
        assert!(perf.total_items_sold >= 12 && perf.total_items_sold <= 60);
    }

    #[test]
    fn test_seed_is_deterministic_with_fixed_seed() {
        let first_dir = TempDir::new().unwrap();
        let second_dir = TempDir::new().unwrap();
        let first = RedbSalesStore::new(first_dir.path().join("sales.redb")).unwrap();
        let second = RedbSalesStore::new(second_dir.path().join("sales.redb")).unwrap();

        seed(&first, &small_config(42), today()).unwrap();
        seed(&second, &small_config(42), today()).unwrap();

        let query = SalesQuery::TopSellingProducts {
            shop_id: ShopId(2),
            limit: 10,
        };
        assert_eq!(first.query(&query).unwrap(), second.query(&query).unwrap());
    }

    #[test]
    fn test_seed_order_dates_within_last_year() {
        let temp_dir = TempDir::new().unwrap();
        let store = RedbSalesStore::new(temp_dir.path().join("sales.redb")).unwrap();
        seed(&store, &small_config(3), today()).unwrap();

        for customer in 1..=10u64 {
            for order in store.customer_orders(CustomerId(customer), None, None).unwrap() {
                assert!(order.date < today());
                assert!(order.date >= today() - Duration::days(365));
            }
        }
    }

    #[test]
    fn test_seed_refuses_non_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = RedbSalesStore::new(temp_dir.path().join("sales.redb")).unwrap();
        seed(&store, &small_config(1), today()).unwrap();

        let err = seed(&store, &small_config(1), today()).unwrap_err();
        assert!(matches!(err, StoreError::AlreadySeeded(2)));
    }
}
