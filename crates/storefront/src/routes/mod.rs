//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                  - Storefront bootstrap payload
//! GET    /health            - Liveness check
//! GET    /health/ready      - Readiness check (catalog reachable)
//!
//! # Products
//! GET    /products          - Product listing (paginated, filtered)
//! GET    /products/{id}     - Product detail
//!
//! # Cart
//! GET    /cart              - Cart view with totals and stored quote
//! POST   /cart/add          - Add a product (snapshot taken at add time)
//! POST   /cart/increment    - One more unit of a line
//! POST   /cart/decrement    - One less unit; removes the line at one
//! POST   /cart/remove       - Drop a line entirely
//! GET    /cart/count        - Cart count badge value
//!
//! # Delivery
//! GET    /delivery/suggest  - Debounced address suggestions
//! POST   /delivery/quote    - Compute and store a delivery quote
//! DELETE /delivery/quote    - Clear the stored quote
//!
//! # Checkout
//! GET    /checkout          - Redirect to the WhatsApp deep link
//! GET    /checkout/preview  - Composed message and link as JSON
//! ```

pub mod cart;
pub mod checkout;
pub mod delivery;
pub mod home;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::geo_rate_limiter;
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/increment", post(cart::increment))
        .route("/decrement", post(cart::decrement))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the delivery routes router.
///
/// Every endpoint in this group fans out to the paid maps provider, so the
/// stricter per-client rate limit wraps the whole group.
pub fn delivery_routes() -> Router<AppState> {
    Router::new()
        .route("/suggest", get(delivery::suggest))
        .route("/quote", post(delivery::quote).delete(delivery::clear))
        .layer(geo_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Bootstrap payload
        .route("/", get(home::home))
        // Product routes
        .nest("/products", product_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // Delivery quoting
        .nest("/delivery", delivery_routes())
        // WhatsApp handoff
        .route("/checkout", get(checkout::redirect))
        .route("/checkout/preview", get(checkout::preview))
}
