//! Cart route handlers.
//!
//! Cart contents live server-side in the [`CartRegistry`]; the session only
//! carries the registry key. Every mutation responds with the refreshed cart
//! view so the client never needs a follow-up read.
//!
//! [`CartRegistry`]: crate::cart_registry::CartRegistry

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use mercadito_core::cart::{Cart, CartLine};
use mercadito_core::delivery::DeliveryQuote;
use mercadito_core::types::ProductId;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::session_keys;
use crate::state::AppState;

// =============================================================================
// Session Helpers
// =============================================================================

/// Read the cart key from the session without creating one.
pub(crate) async fn existing_cart_key(session: &Session) -> Option<Uuid> {
    session
        .get::<Uuid>(session_keys::CART_ID)
        .await
        .ok()
        .flatten()
}

/// Get the cart key from the session, minting one on first use.
pub(crate) async fn cart_key(session: &Session) -> Result<Uuid> {
    if let Some(key) = existing_cart_key(session).await {
        return Ok(key);
    }

    let key = Uuid::new_v4();
    session
        .insert(session_keys::CART_ID, key)
        .await
        .map_err(|source| AppError::Internal(format!("Failed to persist cart key: {source}")))?;
    Ok(key)
}

/// Read the delivery quote stored for this session, if any.
pub(crate) async fn stored_quote(session: &Session) -> Option<DeliveryQuote> {
    session
        .get::<DeliveryQuote>(session_keys::DELIVERY_QUOTE)
        .await
        .ok()
        .flatten()
}

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data.
#[derive(Debug, Serialize)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Delivery summary attached to the cart view.
#[derive(Debug, Serialize)]
pub struct DeliveryView {
    pub address: String,
    pub fee: String,
}

/// Cart display data with the session's delivery quote folded in.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub item_count: u32,
    pub subtotal: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryView>,
    pub total: String,
}

fn format_amount(amount: Decimal) -> String {
    format!("{amount:.2}")
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id,
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price.to_string(),
            line_total: format_amount(line.total()),
            image_url: line.image_url.clone(),
        }
    }
}

impl CartView {
    fn build(cart: &Cart, quote: Option<&DeliveryQuote>) -> Self {
        let subtotal = cart.subtotal();
        let total = quote.map_or(subtotal, |quote| subtotal + quote.fee.amount());

        Self {
            items: cart.lines().iter().map(CartLineView::from).collect(),
            item_count: cart.item_count(),
            subtotal: format_amount(subtotal),
            delivery: quote.map(|quote| DeliveryView {
                address: quote.address.clone(),
                fee: quote.fee.to_string(),
            }),
            total: format_amount(total),
        }
    }
}

async fn view_with_quote(session: &Session, cart: &Cart) -> CartView {
    let quote = stored_quote(session).await;
    CartView::build(cart, quote.as_ref())
}

/// Body for cart mutations; all of them address a line by product.
#[derive(Debug, Deserialize)]
pub struct CartItemRequest {
    pub product_id: ProductId,
}

/// Cart count badge payload.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u32,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart with lines, totals, and any stored delivery quote.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let cart = match existing_cart_key(&session).await {
        Some(key) => state.carts().snapshot(key).await,
        None => Cart::new(),
    };

    Ok(Json(view_with_quote(&session, &cart).await))
}

/// Add one unit of a product to the cart.
///
/// The product snapshot (name, price, image) is fetched from the catalog at
/// add time, so later catalog edits never reprice lines already in the cart.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CartItemRequest>,
) -> Result<Json<CartView>> {
    let product = state.catalog().product(request.product_id).await?;
    if !product.active {
        return Err(AppError::BadRequest(
            "Este producto ya no está disponible.".to_owned(),
        ));
    }

    let key = cart_key(&session).await?;
    let cart = state
        .carts()
        .mutate(key, |cart| {
            cart.add(&product);
            cart.clone()
        })
        .await;

    let product_id = product.id.to_string();
    add_breadcrumb(
        "cart",
        "Added product to cart",
        Some(&[("product_id", product_id.as_str())]),
    );

    Ok(Json(view_with_quote(&session, &cart).await))
}

/// Add one unit of a product already in the cart.
#[instrument(skip(state, session))]
pub async fn increment(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CartItemRequest>,
) -> Result<Json<CartView>> {
    let key = cart_key(&session).await?;
    let cart = state
        .carts()
        .mutate(key, |cart| {
            cart.increment(request.product_id);
            cart.clone()
        })
        .await;

    Ok(Json(view_with_quote(&session, &cart).await))
}

/// Remove one unit of a product; the line disappears below quantity one.
#[instrument(skip(state, session))]
pub async fn decrement(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CartItemRequest>,
) -> Result<Json<CartView>> {
    let key = cart_key(&session).await?;
    let cart = state
        .carts()
        .mutate(key, |cart| {
            cart.decrement(request.product_id);
            cart.clone()
        })
        .await;

    Ok(Json(view_with_quote(&session, &cart).await))
}

/// Remove a line regardless of its quantity.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CartItemRequest>,
) -> Result<Json<CartView>> {
    let key = cart_key(&session).await?;
    let cart = state
        .carts()
        .mutate(key, |cart| {
            cart.remove(request.product_id);
            cart.clone()
        })
        .await;

    let product_id = request.product_id.to_string();
    add_breadcrumb(
        "cart",
        "Removed product from cart",
        Some(&[("product_id", product_id.as_str())]),
    );

    Ok(Json(view_with_quote(&session, &cart).await))
}

/// Get the cart count badge value.
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> Result<Json<CartCount>> {
    let count = match existing_cart_key(&session).await {
        Some(key) => state.carts().snapshot(key).await.item_count(),
        None => 0,
    };

    Ok(Json(CartCount { count }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mercadito_core::types::{CategoryId, Coordinates, Product, StoreId};

    fn product(id: i64, name: &str, price: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            description: None,
            price: price.parse().unwrap(),
            active: true,
            category_id: CategoryId::new(1),
            store_id: StoreId::new(1),
            image_url: None,
            stock: None,
        }
    }

    fn quote(fee_hour: u32) -> DeliveryQuote {
        DeliveryQuote::from_route(
            Coordinates {
                latitude: -14.83,
                longitude: -74.94,
            },
            "Calle Lima 123, Nasca".to_owned(),
            3200.0,
            600,
            fee_hour,
        )
    }

    #[test]
    fn test_view_formats_two_decimal_amounts() {
        let mut cart = Cart::new();
        cart.add(&product(1, "Pan", "1.50"));
        cart.add(&product(1, "Pan", "1.50"));

        let view = CartView::build(&cart, None);
        assert_eq!(view.subtotal, "3.00");
        assert_eq!(view.total, "3.00");
        assert_eq!(view.items.first().unwrap().unit_price, "1.50");
        assert_eq!(view.items.first().unwrap().line_total, "3.00");
        assert!(view.delivery.is_none());
    }

    #[test]
    fn test_view_total_includes_delivery_fee() {
        let mut cart = Cart::new();
        cart.add(&product(1, "Leche", "4.50"));

        // 3.2 km at 14:00 prices at 7.
        let view = CartView::build(&cart, Some(&quote(14)));
        assert_eq!(view.subtotal, "4.50");
        let delivery = view.delivery.unwrap();
        assert_eq!(delivery.fee, "7.00");
        assert_eq!(delivery.address, "Calle Lima 123, Nasca");
        assert_eq!(view.total, "11.50");
    }

    #[test]
    fn test_empty_cart_view_is_zeroed() {
        let view = CartView::build(&Cart::new(), None);
        assert!(view.items.is_empty());
        assert_eq!(view.item_count, 0);
        assert_eq!(view.subtotal, "0.00");
        assert_eq!(view.total, "0.00");
    }
}
