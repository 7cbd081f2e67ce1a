// Core types and storage for the salesdesk sales assistant

pub mod types;
pub mod storage;
pub mod seed;

pub use types::*;
