pub mod error;
pub mod query;
pub mod sales;

pub use error::{StoreError, StoreResult};
pub use query::{SalesQuery, SalesStore};
pub use sales::{RedbSalesStore, SalesWriter};
