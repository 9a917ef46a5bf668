//! Outbound services for the storefront.
//!
//! - `whatsapp` - order handoff deep links

pub mod whatsapp;
