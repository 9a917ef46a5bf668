//! Mercadito Admin library.
//!
//! This crate provides the catalog management functionality as a library,
//! allowing it to be tested and reused.
//!
//! # Security
//!
//! This crate has WRITE access to the catalog backend: products, stores,
//! and categories can be created, changed, and deleted through it. It
//! carries no authentication of its own and is meant to sit behind a
//! private network or reverse proxy, never on the public internet.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod forms;
pub mod routes;
pub mod state;
