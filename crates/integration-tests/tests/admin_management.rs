//! Admin management flows over HTTP.
//!
//! Each test assembles the real admin router against a stub catalog backend
//! and drives it the way the management UI would: JSON store submissions,
//! multipart product and category submissions with an image riding along,
//! and the toggle round trip. The stubs capture what the admin service
//! forwards so the backend wire spellings stay pinned.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router, http::StatusCode};
use serde_json::{Value, json};

use mercadito_admin::backend::AdminClient;
use mercadito_admin::routes;
use mercadito_admin::state::AppState;

use mercadito_integration_tests::{
    StubServer, admin_config, category_row, multipart_fields, product_row, store_row,
    stores_envelope,
};

/// Multipart fields captured by a stub write endpoint.
type CapturedFields = Arc<Mutex<BTreeMap<String, String>>>;

/// JSON body captured by a stub write endpoint.
type CapturedJson = Arc<Mutex<Option<Value>>>;

// =============================================================================
// Service Assembly
// =============================================================================

/// Spawn the real admin app wired to `backend`.
async fn admin_service(backend: &StubServer) -> StubServer {
    let config = admin_config(backend.base_url());
    let client = AdminClient::new(&config.backend).expect("Failed to build backend client");

    let app = Router::new()
        .merge(routes::routes())
        .with_state(AppState::new(config, client));

    StubServer::spawn(app).await
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

async fn body_json(response: reqwest::Response) -> Value {
    response.json().await.expect("Failed to decode JSON body")
}

/// A complete store submission the way the management UI posts it.
fn store_body() -> Value {
    json!({
        "name": "Bodega Central",
        "address": "Av. Principal #123",
        "phone": "956111222",
        "description": "Abarrotes y más",
        "state": true,
        "allDay": false,
        "init": "08:00",
        "close": "20:00",
        "dayOff": 0,
        "lat": -14.8356,
        "long": -74.9399,
    })
}

/// A complete product submission; the caller attaches any image part.
fn product_form() -> reqwest::multipart::Form {
    reqwest::multipart::Form::new()
        .text("name", "Pan Francés")
        .text("description", "Pan del día")
        .text("price", "0.50")
        .text("stock", "12")
        .text("productsCategoryId", "2")
        .text("storeId", "1")
        .text("active", "1")
}

fn png_part(bytes: Vec<u8>, content_type: &str) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(bytes)
        .file_name("pan.png")
        .mime_str(content_type)
        .expect("Failed to build image part")
}

// =============================================================================
// Stores
// =============================================================================

#[tokio::test]
async fn test_store_create_validates_required_fields() {
    let backend = StubServer::spawn(Router::new()).await;
    let admin = admin_service(&backend).await;

    let mut body = store_body();
    body["name"] = json!("   ");
    body["address"] = json!("");
    body["phone"] = json!("");

    let response = client()
        .post(admin.url("/stores"))
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 422);
    let errors = &body_json(response).await["errors"];
    assert_eq!(errors["name"][0], "El nombre del establecimiento es obligatorio.");
    assert_eq!(errors["address"][0], "La dirección es obligatoria.");
    assert_eq!(errors["phone"][0], "El teléfono es obligatorio.");
    // Schedule checks only run once the field-level rules pass
    assert!(errors.get("__all__").is_none());
}

#[tokio::test]
async fn test_store_create_requires_schedule_times() {
    let backend = StubServer::spawn(Router::new()).await;
    let admin = admin_service(&backend).await;

    let mut body = store_body();
    body["init"] = json!("");
    body["close"] = json!("");

    let response = client()
        .post(admin.url("/stores"))
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 422);
    let errors = &body_json(response).await["errors"];
    assert_eq!(
        errors["__all__"][0],
        "Debes especificar el horario de apertura y cierre."
    );
}

#[tokio::test]
async fn test_store_create_forwards_wire_spellings() {
    let captured: CapturedJson = Arc::default();
    let handler_captured = Arc::clone(&captured);
    let backend = StubServer::spawn(Router::new().route(
        "/create-store",
        post(move |Json(body): Json<Value>| {
            let captured = Arc::clone(&handler_captured);
            async move {
                *captured.lock().unwrap() = Some(body);
                Json(json!({"store": store_row(4, "Bodega Central", true)}))
            }
        }),
    ))
    .await;
    let admin = admin_service(&backend).await;

    let response = client()
        .post(admin.url("/stores"))
        .json(&store_body())
        .send()
        .await
        .expect("Failed to create store");

    assert_eq!(response.status(), 201);
    let body = body_json(response).await;
    assert_eq!(body["store"]["name"], "Bodega Central");
    assert_eq!(body["store"]["active"], true);

    let sent = captured.lock().unwrap().clone().expect("Backend saw no write");
    assert_eq!(sent["state"], true);
    assert_eq!(sent["allDay"], false);
    assert_eq!(sent["dayOff"], 0);
    assert_eq!(sent["init"], "08:00");
    assert_eq!(sent["close"], "20:00");
    assert_eq!(sent["lat"], -14.8356);
    assert_eq!(sent["long"], -74.9399);
    assert!(sent.get("active").is_none());
    assert!(sent.get("all_day").is_none());
}

#[tokio::test]
async fn test_missing_store_is_not_found() {
    let backend = StubServer::spawn(Router::new().route(
        "/stores",
        get(|| async { Json(stores_envelope(vec![store_row(1, "Bodega Central", true)])) }),
    ))
    .await;
    let admin = admin_service(&backend).await;

    let response = client()
        .get(admin.url("/stores/99"))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
    assert_eq!(body_json(response).await["error"], "No encontrado.");
}

#[tokio::test]
async fn test_backend_failure_maps_to_bad_gateway() {
    let backend = StubServer::spawn(Router::new().route(
        "/stores",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "backend exploded") }),
    ))
    .await;
    let admin = admin_service(&backend).await;

    let response = client()
        .get(admin.url("/stores"))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 502);
    assert_eq!(
        body_json(response).await["error"],
        "Error al comunicarse con el catálogo."
    );
}

// =============================================================================
// Products
// =============================================================================

#[tokio::test]
async fn test_product_create_round_trips_multipart() {
    let captured: CapturedFields = Arc::default();
    let handler_captured = Arc::clone(&captured);
    let backend = StubServer::spawn(Router::new().route(
        "/create-product",
        post(move |multipart: Multipart| {
            let captured = Arc::clone(&handler_captured);
            async move {
                *captured.lock().unwrap() = multipart_fields(multipart).await;
                Json(json!({"data": product_row(7, "Pan Francés", "0.50", 2, 1, true)}))
            }
        }),
    ))
    .await;
    let admin = admin_service(&backend).await;

    let png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    let form = product_form().part("image", png_part(png, "image/png"));

    let response = client()
        .post(admin.url("/products"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to create product");

    assert_eq!(response.status(), 201);
    let body = body_json(response).await;
    assert_eq!(body["product"]["name"], "Pan Francés");
    assert_eq!(body["product"]["price"], "0.50");
    assert_eq!(body["product"]["active"], true);

    let sent = captured.lock().unwrap().clone();
    assert_eq!(sent["name"], "Pan Francés");
    assert_eq!(sent["description"], "Pan del día");
    assert_eq!(sent["price"], "0.50");
    assert_eq!(sent["stock"], "12");
    assert_eq!(sent["productsCategoryId"], "2");
    assert_eq!(sent["storeId"], "1");
    assert_eq!(sent["active"], "1");
    assert_eq!(sent["image"], "file:pan.png:image/png:8");
}

#[tokio::test]
async fn test_product_create_requires_core_fields() {
    let backend = StubServer::spawn(Router::new()).await;
    let admin = admin_service(&backend).await;

    let form = reqwest::multipart::Form::new().text("description", "sin nada más");
    let response = client()
        .post(admin.url("/products"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 422);
    let errors = &body_json(response).await["errors"];
    for field in ["name", "price", "stock", "category_id", "store_id"] {
        assert_eq!(
            errors[field][0], "Por favor, completa todos los campos obligatorios",
            "field {field}"
        );
    }
}

#[tokio::test]
async fn test_oversized_image_is_rejected() {
    let backend = StubServer::spawn(Router::new()).await;
    let admin = admin_service(&backend).await;

    let form = product_form().part("image", png_part(vec![0; 5 * 1024 * 1024 + 1], "image/png"));
    let response = client()
        .post(admin.url("/products"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 422);
    let errors = &body_json(response).await["errors"];
    assert_eq!(errors["image"][0], "La imagen no debe superar los 5MB");
}

#[tokio::test]
async fn test_unsupported_image_type_is_rejected() {
    let backend = StubServer::spawn(Router::new()).await;
    let admin = admin_service(&backend).await;

    let form = product_form().part("image", png_part(vec![0x47, 0x49, 0x46], "image/gif"));
    let response = client()
        .post(admin.url("/products"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 422);
    let errors = &body_json(response).await["errors"];
    assert_eq!(
        errors["image"][0],
        "Por favor, sube una imagen en formato JPG, PNG o WebP"
    );
}

#[tokio::test]
async fn test_toggle_resubmits_every_field_flipped() {
    let captured: CapturedFields = Arc::default();
    let handler_captured = Arc::clone(&captured);
    let backend = StubServer::spawn(
        Router::new()
            .route(
                "/product/{id}",
                get(|Path(id): Path<i64>| async move {
                    Json(json!({"data": {"product": product_row(id, "Pan Francés", "0.50", 2, 1, true)}}))
                }),
            )
            .route(
                "/update-product/{id}",
                put(move |Path(id): Path<i64>, multipart: Multipart| {
                    let captured = Arc::clone(&handler_captured);
                    async move {
                        *captured.lock().unwrap() = multipart_fields(multipart).await;
                        Json(json!({"data": product_row(id, "Pan Francés", "0.50", 2, 1, false)}))
                    }
                }),
            ),
    )
    .await;
    let admin = admin_service(&backend).await;

    let response = client()
        .post(admin.url("/products/7/toggle"))
        .send()
        .await
        .expect("Failed to toggle product");

    assert_eq!(response.status(), 200);
    assert_eq!(body_json(response).await["product"]["active"], false);

    // The whole product went back out, flag inverted, no image part
    let sent = captured.lock().unwrap().clone();
    assert_eq!(sent["active"], "0");
    assert_eq!(sent["name"], "Pan Francés");
    assert_eq!(sent["price"], "0.50");
    assert_eq!(sent["stock"], "0");
    assert_eq!(sent["productsCategoryId"], "2");
    assert_eq!(sent["storeId"], "1");
    assert!(!sent.contains_key("image"));
}

#[tokio::test]
async fn test_delete_product_forwards_and_returns_no_content() {
    let deleted: CapturedJson = Arc::default();
    let handler_deleted = Arc::clone(&deleted);
    let backend = StubServer::spawn(Router::new().route(
        "/delete-product/{id}",
        delete(move |Path(id): Path<i64>| {
            let deleted = Arc::clone(&handler_deleted);
            async move {
                *deleted.lock().unwrap() = Some(json!(id));
                StatusCode::OK
            }
        }),
    ))
    .await;
    let admin = admin_service(&backend).await;

    let response = client()
        .delete(admin.url("/products/7"))
        .send()
        .await
        .expect("Failed to delete product");

    assert_eq!(response.status(), 204);
    assert_eq!(deleted.lock().unwrap().clone(), Some(json!(7)));
}

// =============================================================================
// Categories
// =============================================================================

#[tokio::test]
async fn test_category_create_forwards_name_and_order() {
    let captured: CapturedFields = Arc::default();
    let handler_captured = Arc::clone(&captured);
    let backend = StubServer::spawn(Router::new().route(
        "/create-category",
        post(move |multipart: Multipart| {
            let captured = Arc::clone(&handler_captured);
            async move {
                *captured.lock().unwrap() = multipart_fields(multipart).await;
                Json(json!({"data": category_row(9, "Bebidas", 3)}))
            }
        }),
    ))
    .await;
    let admin = admin_service(&backend).await;

    let form = reqwest::multipart::Form::new()
        .text("name", "Bebidas")
        .text("order", "3");
    let response = client()
        .post(admin.url("/categories"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to create category");

    assert_eq!(response.status(), 201);
    let body = body_json(response).await;
    assert_eq!(body["category"]["name"], "Bebidas");
    assert_eq!(body["category"]["order"], 3);

    let sent = captured.lock().unwrap().clone();
    assert_eq!(sent["name"], "Bebidas");
    assert_eq!(sent["order"], "3");
}
