//! HTTP route handlers for the admin service.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                 - Liveness check
//! GET    /health/ready           - Readiness check (catalog reachable)
//!
//! # Products (multipart writes, optional image)
//! GET    /products               - Product listing (paginated)
//! POST   /products               - Create product
//! GET    /products/{id}          - Product detail
//! PUT    /products/{id}          - Update product
//! DELETE /products/{id}          - Delete product
//! POST   /products/{id}/toggle   - Flip the active flag
//!
//! # Stores (JSON writes)
//! GET    /stores                 - Store listing
//! POST   /stores                 - Create store
//! GET    /stores/{id}            - Store detail
//! PUT    /stores/{id}            - Update store
//! DELETE /stores/{id}            - Delete store
//! POST   /stores/{id}/toggle     - Flip the active flag
//!
//! # Categories (multipart writes, optional image)
//! GET    /categories             - Category listing
//! POST   /categories             - Create category
//! GET    /categories/{id}        - Category detail
//! PUT    /categories/{id}        - Update category
//! DELETE /categories/{id}        - Delete category
//! ```

pub mod categories;
pub mod products;
pub mod stores;

use axum::{Router, extract::DefaultBodyLimit, routing::get, routing::post};

use crate::forms::MAX_IMAGE_BYTES;
use crate::state::AppState;

/// Cap for multipart bodies: the image cap plus slack for the text fields.
const UPLOAD_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 1024 * 1024;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .route("/{id}/toggle", post(products::toggle))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

/// Create the store routes router.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stores::index).post(stores::create))
        .route(
            "/{id}",
            get(stores::show).put(stores::update).delete(stores::destroy),
        )
        .route("/{id}/toggle", post(stores::toggle))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route(
            "/{id}",
            get(categories::show)
                .put(categories::update)
                .delete(categories::destroy),
        )
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

/// Create all routes for the admin service.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .nest("/stores", store_routes())
        .nest("/categories", category_routes())
}
