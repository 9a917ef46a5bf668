//! Session-related types.
//!
//! The session itself stays small: it holds the key of the shopper's cart in
//! the in-process registry plus the delivery state for the open cart modal.
//! Cart contents live in [`crate::cart_registry::CartRegistry`].

/// Session keys for shopper state.
pub mod keys {
    /// Key for the cart's identifier in the cart registry.
    pub const CART_ID: &str = "cart_id";

    /// Key for the delivery quote attached to the current cart.
    pub const DELIVERY_QUOTE: &str = "delivery_quote";
}
