//! Checkout handoff routes.
//!
//! Checkout is a WhatsApp deep link: the order message is composed from the
//! cart and the stored delivery quote, then the shopper is redirected to
//! `wa.me`. No order state is kept here; the conversation continues in
//! WhatsApp, and the cart stays intact for follow-up edits.

use axum::{Json, extract::State, response::Redirect};
use tower_sessions::Session;
use tracing::instrument;

use mercadito_core::cart::Cart;

use crate::routes::cart::{existing_cart_key, stored_quote};
use crate::services::whatsapp::{WhatsAppHandoff, order_link};
use crate::state::AppState;

async fn compose(state: &AppState, session: &Session) -> WhatsAppHandoff {
    let cart = match existing_cart_key(session).await {
        Some(key) => state.carts().snapshot(key).await,
        None => Cart::new(),
    };
    let quote = stored_quote(session).await;

    order_link(&state.config().whatsapp.number, &cart, quote.as_ref())
}

/// Redirect to the WhatsApp conversation with the composed order message.
#[instrument(skip(state, session))]
pub async fn redirect(State(state): State<AppState>, session: Session) -> Redirect {
    let handoff = compose(&state, &session).await;
    Redirect::to(&handoff.url)
}

/// Return the composed message and link for clients that open it themselves.
#[instrument(skip(state, session))]
pub async fn preview(State(state): State<AppState>, session: Session) -> Json<WhatsAppHandoff> {
    Json(compose(&state, &session).await)
}
