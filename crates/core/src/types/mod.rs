//! Core types for Mercadito.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod id;
pub mod price;
pub mod product;
pub mod store;

pub use category::Category;
pub use id::*;
pub use price::{Price, PriceError};
pub use product::Product;
pub use store::{Coordinates, Schedule, ScheduleError, Store};
