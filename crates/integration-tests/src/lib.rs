//! Integration test harness for Mercadito.
//!
//! The tests in `tests/` spin up a stub catalog/geo backend on a loopback
//! port and point the real service clients (or a whole assembled service)
//! at it, so request shapes, response envelopes, and row normalization are
//! exercised end to end without a live deployment.
//!
//! This crate provides the shared plumbing: [`StubServer`] for serving a
//! canned [`axum::Router`], builders for backend-shaped rows and envelopes,
//! and ready-made service configurations pointing at a stub's base URL.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::Router;
use axum::extract::Multipart;
use secrecy::SecretString;
use serde_json::{Value, json};

use mercadito_admin::config::AdminConfig;
use mercadito_storefront::config::{
    BackendConfig, GeoConfig, StorefrontConfig, WhatsAppConfig,
};

/// Stand-in maps provider key; only needs to be a valid header value.
const TEST_MAPS_KEY: &str = "tK9#vR2$wX7!qM4@zL8%nB3^cF6&";

// =============================================================================
// Stub Server
// =============================================================================

/// A canned HTTP server on an ephemeral loopback port.
///
/// The serve task is aborted when the value is dropped, so each test owns
/// its server for exactly the test's lifetime.
pub struct StubServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl StubServer {
    /// Serve `router` on `127.0.0.1:0` and return once the port is bound.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn(router: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub server");
        let addr = listener.local_addr().expect("Failed to read bound address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Stub server error");
        });

        Self {
            base_url: format!("http://{addr}"),
            handle,
        }
    }

    /// Like [`StubServer::spawn`], with peer addresses attached to requests.
    ///
    /// The storefront's rate limiter keys on the client IP and falls back to
    /// the peer address, so the assembled storefront app must be served this
    /// way (mirroring its binary).
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn_with_connect_info(router: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub server");
        let addr = listener.local_addr().expect("Failed to read bound address");

        let handle = tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Stub server error");
        });

        Self {
            base_url: format!("http://{addr}"),
            handle,
        }
    }

    /// Base URL of the running server, e.g. `http://127.0.0.1:49152`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `base_url` with a path appended.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// =============================================================================
// Service Configurations
// =============================================================================

/// Storefront configuration with every outbound URL pointing at `backend_url`.
#[must_use]
pub fn storefront_config(backend_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost:3000".to_owned(),
        backend: BackendConfig {
            base_url: backend_url.to_owned(),
        },
        geo: GeoConfig {
            base_url: backend_url.to_owned(),
            api_key: SecretString::from(TEST_MAPS_KEY),
            region: "Nasca, Ica, Perú".to_owned(),
            origin_latitude: -14.8356,
            origin_longitude: -74.9399,
        },
        whatsapp: WhatsAppConfig {
            number: "918647161".to_owned(),
        },
        sentry_dsn: None,
    }
}

/// Admin configuration pointing at `backend_url`.
#[must_use]
pub fn admin_config(backend_url: &str) -> AdminConfig {
    AdminConfig {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
        port: 0,
        backend: mercadito_admin::config::BackendConfig {
            base_url: backend_url.to_owned(),
        },
        sentry_dsn: None,
    }
}

// =============================================================================
// Backend Row Builders
// =============================================================================

/// A product row the way the backend sends it: string price, `0`/`1` flag.
#[must_use]
pub fn product_row(
    id: i64,
    name: &str,
    price: &str,
    category: i64,
    store: i64,
    active: bool,
) -> Value {
    json!({
        "id": id,
        "name": name,
        "price": price,
        "active": u8::from(active),
        "productsCategoryId": category,
        "storeId": store,
    })
}

/// A minimal store row. Tests merge extra fields in when they need them.
#[must_use]
pub fn store_row(id: i64, name: &str, active: bool) -> Value {
    json!({ "id": id, "name": name, "active": active })
}

/// A category row.
#[must_use]
pub fn category_row(id: i64, name: &str, order: i32) -> Value {
    json!({ "id": id, "name": name, "order": order })
}

/// The product list envelope: `{"data": {"products": …, "pagination": …}}`.
#[must_use]
pub fn products_envelope(products: Vec<Value>, page: u32, limit: u32, total: u32) -> Value {
    json!({
        "data": {
            "products": products,
            "pagination": {
                "page": page,
                "limit": limit,
                "total": total,
                "totalPages": total.div_ceil(limit.max(1)),
            },
        }
    })
}

/// The stores envelope: `{"data": {"stores": …}}`.
#[must_use]
pub fn stores_envelope(stores: Vec<Value>) -> Value {
    json!({ "data": { "stores": stores } })
}

// =============================================================================
// Multipart Capture
// =============================================================================

/// Collect a multipart submission into a field map for assertions.
///
/// Text parts map to their value; file parts map to
/// `file:{file_name}:{content_type}:{byte_len}` so tests can check the
/// upload rode along without hauling the bytes around.
///
/// # Panics
///
/// Panics if the body cannot be read as multipart.
pub async fn multipart_fields(mut multipart: Multipart) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .expect("Failed to read multipart field")
    {
        let name = field.name().unwrap_or("").to_owned();
        let file_name = field.file_name().map(ToOwned::to_owned);
        let content_type = field.content_type().map(ToOwned::to_owned);

        match file_name {
            Some(file_name) => {
                let bytes = field.bytes().await.expect("Failed to read file part");
                fields.insert(
                    name,
                    format!(
                        "file:{file_name}:{}:{}",
                        content_type.unwrap_or_default(),
                        bytes.len()
                    ),
                );
            }
            None => {
                fields.insert(name, field.text().await.expect("Failed to read text part"));
            }
        }
    }
    fields
}
