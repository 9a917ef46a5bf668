//! Catalog client tests against a stub backend.
//!
//! A canned backend serves the loose row shapes the real one produces
//! (string prices, `0`/`1` flags, both active-flag spellings) and the real
//! [`CatalogClient`] is pointed at it, covering envelope unwrapping, row
//! normalization, error classification, and the cache rules.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::routing::get;
use axum::{Json, Router, http::StatusCode};
use serde_json::json;

use mercadito_core::types::{ProductId, StoreId};
use mercadito_storefront::backend::{CatalogClient, CatalogError, ProductQuery};
use mercadito_storefront::config::BackendConfig;

use mercadito_integration_tests::{
    StubServer, product_row, products_envelope, store_row, stores_envelope,
};

// =============================================================================
// Helpers
// =============================================================================

fn catalog_client(server: &StubServer) -> CatalogClient {
    CatalogClient::new(&BackendConfig {
        base_url: server.base_url().to_owned(),
    })
    .expect("Failed to build catalog client")
}

// =============================================================================
// Products
// =============================================================================

#[tokio::test]
async fn test_products_page_skips_invalid_rows() {
    let rows = vec![
        product_row(1, "Pan Francés", "0.50", 1, 1, true),
        // Negative price fails normalization
        product_row(2, "Leche", "-4.50", 1, 1, true),
        // Missing name fails normalization
        json!({"id": 3, "price": "2.00", "active": 1, "productsCategoryId": 1, "storeId": 1}),
    ];
    let envelope = products_envelope(rows, 1, 12, 30);
    let server = StubServer::spawn(
        Router::new().route("/products", get(move || {
            let envelope = envelope.clone();
            async move { Json(envelope) }
        })),
    )
    .await;

    let page = catalog_client(&server)
        .products(&ProductQuery::first_page())
        .await
        .expect("Failed to fetch products");

    assert_eq!(page.products.len(), 1);
    assert_eq!(page.products.first().unwrap().name, "Pan Francés");
    assert_eq!(page.pagination.total, 30);
    assert_eq!(page.pagination.total_pages, 3);
    assert!(page.pagination.has_more());
}

#[tokio::test]
async fn test_product_detail_unwraps_envelope_and_caches() {
    let hits = Arc::new(AtomicUsize::new(0));
    let handler_hits = Arc::clone(&hits);
    let server = StubServer::spawn(
        Router::new().route("/product/{id}", get(move || {
            let hits = Arc::clone(&handler_hits);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Json(json!({"data": {"product": product_row(7, "Pan Francés", "0.50", 2, 1, true)}}))
            }
        })),
    )
    .await;
    let client = catalog_client(&server);

    let product = client
        .product(ProductId::new(7))
        .await
        .expect("Failed to fetch product");
    assert_eq!(product.id, ProductId::new(7));
    assert_eq!(product.price.to_string(), "0.50");
    assert!(product.active);

    // Second read is served from the cache
    let again = client
        .product(ProductId::new(7))
        .await
        .expect("Failed to fetch product again");
    assert_eq!(again, product);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_product_is_not_found_and_final() {
    let server = StubServer::spawn(
        Router::new().route("/product/{id}", get(|| async { StatusCode::NOT_FOUND })),
    )
    .await;

    let error = catalog_client(&server)
        .product(ProductId::new(99))
        .await
        .expect_err("A 404 must not produce a product");

    assert!(matches!(error, CatalogError::NotFound(_)));
    assert!(!error.is_retryable());
}

#[tokio::test]
async fn test_backend_failure_is_retryable() {
    let server = StubServer::spawn(Router::new().route(
        "/products",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "backend exploded") }),
    ))
    .await;

    let error = catalog_client(&server)
        .products(&ProductQuery::first_page())
        .await
        .expect_err("A 500 must surface as an error");

    assert!(matches!(error, CatalogError::Api { status: 500, .. }));
    assert!(error.is_retryable());
}

#[tokio::test]
async fn test_browse_pages_cached_but_searches_never() {
    let hits = Arc::new(AtomicUsize::new(0));
    let handler_hits = Arc::clone(&hits);
    let server = StubServer::spawn(
        Router::new().route("/products", get(move || {
            let hits = Arc::clone(&handler_hits);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Json(products_envelope(
                    vec![product_row(1, "Pan Francés", "0.50", 1, 1, true)],
                    1,
                    12,
                    1,
                ))
            }
        })),
    )
    .await;
    let client = catalog_client(&server);

    // Two identical browse requests, one backend hit
    client.products(&ProductQuery::first_page()).await.unwrap();
    client.products(&ProductQuery::first_page()).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    // Searches bypass the cache in both directions
    let mut search = ProductQuery::first_page();
    search.term = Some("pan".to_owned());
    client.products(&search).await.unwrap();
    client.products(&search).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

// =============================================================================
// Stores and Categories
// =============================================================================

#[tokio::test]
async fn test_stores_cached_and_both_flag_spellings_accepted() {
    let hits = Arc::new(AtomicUsize::new(0));
    let handler_hits = Arc::clone(&hits);
    let server = StubServer::spawn(
        Router::new().route("/stores", get(move || {
            let hits = Arc::clone(&handler_hits);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Json(stores_envelope(vec![
                    store_row(1, "Bodega Central", true),
                    // Older rows spell the flag `state`
                    json!({"id": 2, "name": "Minimarket Sur", "state": 1}),
                    store_row(3, "Kiosko Plaza", false),
                ]))
            }
        })),
    )
    .await;
    let client = catalog_client(&server);

    let stores = client.stores().await.expect("Failed to fetch stores");
    assert_eq!(stores.len(), 3);

    let active = client
        .active_store_ids()
        .await
        .expect("Failed to compute active store ids");
    assert!(active.contains(&StoreId::new(1)));
    assert!(active.contains(&StoreId::new(2)));
    assert!(!active.contains(&StoreId::new(3)));

    // Both calls above share one cached fetch
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_categories_bare_array_skips_blank_rows() {
    let server = StubServer::spawn(Router::new().route(
        "/categories",
        get(|| async {
            Json(json!([
                {"id": 1, "name": "Bebidas", "order": 1},
                {"id": 2, "name": "   "},
                {"id": 3}
            ]))
        }),
    ))
    .await;

    let categories = catalog_client(&server)
        .categories()
        .await
        .expect("Failed to fetch categories");

    assert_eq!(categories.len(), 1);
    assert_eq!(categories.first().unwrap().name, "Bebidas");
}
