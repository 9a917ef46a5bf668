//! Mercadito Core - Shared domain library.
//!
//! This crate provides the common types and pure logic used across all
//! Mercadito components:
//! - `storefront` - Public shopper-facing service
//! - `admin` - Internal catalog management service
//! - `cli` - Command-line tools for quotes and catalog inspection
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no async. This keeps it lightweight and allows it to be used
//! anywhere, including in plain unit tests.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, and the Product/Category/Store entities
//! - [`catalog`] - Visibility filtering over products
//! - [`cart`] - In-memory cart with snapshot-at-add semantics
//! - [`delivery`] - Delivery fee schedule and quote types
//! - [`checkout`] - WhatsApp order message composition
//! - [`records`] - Tolerant decoding of raw catalog backend rows

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod delivery;
pub mod records;
pub mod types;

pub use types::*;
