pub mod core;
pub mod error;
pub mod metadata;
pub mod pagination;
pub mod query;
pub mod records;
