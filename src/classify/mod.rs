//! Categorization and aggregation of extracted transactions.

pub mod aggregate;
pub mod category;
