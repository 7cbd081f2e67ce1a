use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the sales store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database could not be opened or reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[from] redb::Error),

    #[error("{0} not found")]
    NotFound(String),

    /// A stored row could not be encoded or decoded
    #[error("corrupt row: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("store already contains {0} shop(s), refusing to seed")]
    AlreadySeeded(u64),
}

macro_rules! from_redb {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for StoreError {
                fn from(err: $ty) -> Self {
                    Self::Database(err.into())
                }
            }
        )*
    };
}

from_redb!(
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError
);
