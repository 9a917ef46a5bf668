//! CLI command implementations.

pub mod products;
pub mod quote;
pub mod stores;
