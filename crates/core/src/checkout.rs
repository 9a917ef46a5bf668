//! WhatsApp order message composition.
//!
//! Pure text building: the caller percent-encodes the result into a
//! `wa.me` deep link and hands it to the shopper's browser. Nothing here
//! talks to the network.
//!
//! The itemized format is fixed and customer-facing; tests pin it down
//! byte-for-byte so a wording change is always deliberate.

use crate::cart::Cart;
use crate::delivery::DeliveryQuote;

/// Greeting sent when the shopper checks out with an empty cart.
pub const EMPTY_CART_MESSAGE: &str = "Hola!, quiero realizar una compra";

/// Render the cart (and optional delivery quote) as an order message.
///
/// Non-empty carts produce the itemized Spanish order: one block per line
/// with quantity, unit price, and line total (two decimals throughout),
/// then a summary with item count and the amount to pay. When a quote is
/// present the summary also carries the delivery address and fee, and the
/// total includes the fee. An empty cart yields [`EMPTY_CART_MESSAGE`].
#[must_use]
pub fn order_message(cart: &Cart, quote: Option<&DeliveryQuote>) -> String {
    if cart.is_empty() {
        return EMPTY_CART_MESSAGE.to_owned();
    }

    let items = cart
        .lines()
        .iter()
        .map(|line| {
            format!(
                "🔹 *{}*\n   Cantidad: {} x ${:.2} = ${:.2}",
                line.name,
                line.quantity,
                line.unit_price.amount(),
                line.total()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let subtotal = cart.subtotal();
    let mut message = format!(
        "*¡Hola! Quiero realizar el siguiente pedido:*\n\n{items}\n\n\
         💰 *RESUMEN DEL PEDIDO*\n\
         📦 Cantidad de productos: {}\n",
        cart.item_count()
    );

    if let Some(quote) = quote {
        let total = subtotal + quote.fee.amount();
        message.push_str(&format!(
            "🛒 Subtotal: ${subtotal:.2}\n\
             📍 Dirección de entrega: {}\n\
             🚚 Costo de delivery: ${}\n\
             💵 *TOTAL A PAGAR: ${total:.2}*",
            quote.address, quote.fee
        ));
    } else {
        message.push_str(&format!("💵 *TOTAL A PAGAR: ${subtotal:.2}*"));
    }

    message.push_str("\n\nEspero su confirmación.");
    message
}
