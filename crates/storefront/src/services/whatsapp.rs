//! WhatsApp order handoff.
//!
//! Checkout does not place an order anywhere: it renders the cart into a
//! message and hands the shopper a `wa.me` deep link addressed to the shop's
//! number. Opening the link is the client's job; no network call is made
//! here.

use serde::Serialize;

use mercadito_core::cart::Cart;
use mercadito_core::checkout::order_message;
use mercadito_core::delivery::DeliveryQuote;

/// A ready-to-open order handoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WhatsAppHandoff {
    /// The plain-text order message.
    pub message: String,
    /// `wa.me` deep link with the message percent-encoded.
    pub url: String,
}

/// Build the order deep link for the configured destination number.
#[must_use]
pub fn order_link(number: &str, cart: &Cart, quote: Option<&DeliveryQuote>) -> WhatsAppHandoff {
    let message = order_message(cart, quote);
    let url = format!(
        "https://wa.me/{number}?text={}",
        urlencoding::encode(&message)
    );
    WhatsAppHandoff { message, url }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mercadito_core::types::{CategoryId, Product, ProductId, StoreId};

    #[test]
    fn test_empty_cart_links_generic_greeting() {
        let handoff = order_link("918647161", &Cart::new(), None);
        assert_eq!(handoff.message, "Hola!, quiero realizar una compra");
        assert_eq!(
            handoff.url,
            "https://wa.me/918647161?text=Hola%21%2C%20quiero%20realizar%20una%20compra"
        );
    }

    #[test]
    fn test_link_carries_configured_number_and_encoded_message() {
        let mut cart = Cart::new();
        cart.add(&Product {
            id: ProductId::new(1),
            name: "Pan Francés".to_owned(),
            description: None,
            price: "0.50".parse().unwrap(),
            active: true,
            category_id: CategoryId::new(1),
            store_id: StoreId::new(1),
            image_url: None,
            stock: None,
        });

        let handoff = order_link("51999888777", &cart, None);
        assert!(handoff.url.starts_with("https://wa.me/51999888777?text="));
        // The raw message must never leak unencoded into the URL
        assert!(!handoff.url.contains(' '));
        assert!(handoff.message.contains("Pan Francés"));
    }
}
