//! Catalog backend admin client.
//!
//! Wraps the backend's read and write endpoints with `reqwest` 0.13. The
//! write surface speaks the backend's native dialect: products and
//! categories go out as multipart forms (an image file rides along when one
//! was uploaded), stores as JSON with the active flag spelled `state`.
//! Rows coming back are normalized by [`mercadito_core::records`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use mercadito_core::catalog::{Pagination, ProductPage};
use mercadito_core::records::{CategoryRecord, ProductRecord, StoreRecord};
use mercadito_core::{Category, CategoryId, Product, ProductId, Store, StoreId};

use crate::config::BackendConfig;

/// Request timeout for backend calls; image uploads ride on the same limit.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when talking to the catalog backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connect, timeout, body).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

// =============================================================================
// Write Inputs
// =============================================================================

/// Fields for creating or updating a product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: u32,
    pub category_id: CategoryId,
    pub store_id: StoreId,
    pub active: bool,
}

/// Fields for creating or updating a store, spelled the way the backend
/// expects them on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreInput {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub description: String,
    /// The active flag; store writes spell it `state`.
    pub state: bool,
    pub all_day: bool,
    /// Opening time, `HH:MM`
    pub init: String,
    /// Closing time, `HH:MM`
    pub close: String,
    /// 0 = Sunday .. 6 = Saturday; `None` for stores with no closing day.
    pub day_off: Option<u8>,
    pub lat: Option<f64>,
    pub long: Option<f64>,
}

/// Fields for creating or updating a category.
#[derive(Debug, Clone)]
pub struct CategoryInput {
    pub name: String,
    pub order: Option<i32>,
}

/// An image file accompanying a product or category submission.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

// =============================================================================
// Client
// =============================================================================

/// Client for the catalog backend's management endpoints.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl AdminClient {
    /// Create a new admin client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(AdminClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Fetch one page of products, inactive ones included.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; individual invalid rows are
    /// skipped, not errors.
    #[instrument(skip(self))]
    pub async fn products(&self, page: u32, limit: u32) -> Result<ProductPage, BackendError> {
        let params = [("page", page.to_string()), ("limit", limit.to_string())];
        let url = format!("{}/products", self.inner.base_url);
        let envelope: DataEnvelope<ProductsPayload> = self
            .execute(self.inner.client.get(&url).query(&params), "/products")
            .await?;

        Ok(ProductPage {
            products: normalize_rows::<ProductRecord, Product>(envelope.data.products, "product"),
            pagination: envelope.data.pagination,
        })
    }

    /// Fetch a single product by id.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] for unknown ids, or another error
    /// if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product, BackendError> {
        let url = format!("{}/product/{id}", self.inner.base_url);
        let envelope: DataEnvelope<ProductPayload> =
            self.execute(self.inner.client.get(&url), "/product").await?;
        product_from_row(envelope.data.product)
    }

    /// Fetch all stores, inactive ones included.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn stores(&self) -> Result<Vec<Store>, BackendError> {
        let url = format!("{}/stores", self.inner.base_url);
        let envelope: DataEnvelope<StoresPayload> =
            self.execute(self.inner.client.get(&url), "/stores").await?;
        Ok(normalize_rows::<StoreRecord, Store>(envelope.data.stores, "store"))
    }

    /// Fetch a single store by id.
    ///
    /// The backend has no single-store read, so this filters the full list.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] for unknown ids, or another error
    /// if the list fetch fails.
    pub async fn store(&self, id: StoreId) -> Result<Store, BackendError> {
        self.stores()
            .await?
            .into_iter()
            .find(|store| store.id == id)
            .ok_or_else(|| BackendError::NotFound(format!("store {id}")))
    }

    /// Fetch all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, BackendError> {
        let url = format!("{}/categories", self.inner.base_url);
        // Unlike the other endpoints, this one returns a bare array.
        let rows: Vec<serde_json::Value> =
            self.execute(self.inner.client.get(&url), "/categories").await?;
        Ok(normalize_rows::<CategoryRecord, Category>(rows, "category"))
    }

    /// Fetch a single category by id.
    ///
    /// The backend has no single-category read, so this filters the full
    /// list.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] for unknown ids, or another error
    /// if the list fetch fails.
    pub async fn category(&self, id: CategoryId) -> Result<Category, BackendError> {
        self.categories()
            .await?
            .into_iter()
            .find(|category| category.id == id)
            .ok_or_else(|| BackendError::NotFound(format!("category {id}")))
    }

    /// Cheap backend connectivity probe for the readiness endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or unhealthy.
    pub async fn ping(&self) -> Result<(), BackendError> {
        let url = format!("{}/categories", self.inner.base_url);
        let response = self.inner.client.get(&url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(BackendError::Api {
                status: status.as_u16(),
                message: "readiness probe failed".to_owned(),
            })
        }
    }

    // -------------------------------------------------------------------------
    // Product writes
    // -------------------------------------------------------------------------

    /// Create a product, with an optional image file.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload fails or the backend rejects it.
    #[instrument(skip(self, input, image), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        input: &ProductInput,
        image: Option<ImageUpload>,
    ) -> Result<Product, BackendError> {
        let url = format!("{}/create-product", self.inner.base_url);
        let form = product_form(input, image)?;
        let envelope: DataEnvelope<serde_json::Value> = self
            .execute(self.inner.client.post(&url).multipart(form), "/create-product")
            .await?;
        product_from_row(envelope.data)
    }

    /// Update a product; `image` replaces the stored one only when present.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] for unknown ids, or another error
    /// if the upload fails.
    #[instrument(skip(self, input, image), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
        image: Option<ImageUpload>,
    ) -> Result<Product, BackendError> {
        let url = format!("{}/update-product/{id}", self.inner.base_url);
        let form = product_form(input, image)?;
        let envelope: DataEnvelope<serde_json::Value> = self
            .execute(self.inner.client.put(&url).multipart(form), "/update-product")
            .await?;
        product_from_row(envelope.data)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] for unknown ids, or another error
    /// if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), BackendError> {
        let url = format!("{}/delete-product/{id}", self.inner.base_url);
        self.execute_empty(self.inner.client.delete(&url), "/delete-product")
            .await
    }

    // -------------------------------------------------------------------------
    // Store writes
    // -------------------------------------------------------------------------

    /// Create a store.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_store(&self, input: &StoreInput) -> Result<Store, BackendError> {
        let url = format!("{}/create-store", self.inner.base_url);
        let envelope: StoreEnvelope = self
            .execute(self.inner.client.post(&url).json(input), "/create-store")
            .await?;
        store_from_row(envelope.store)
    }

    /// Update a store.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] for unknown ids, or another error
    /// if the request fails.
    #[instrument(skip(self, input), fields(store_id = %id))]
    pub async fn update_store(&self, id: StoreId, input: &StoreInput) -> Result<Store, BackendError> {
        let url = format!("{}/edit-store/{id}", self.inner.base_url);
        let envelope: StoreEnvelope = self
            .execute(self.inner.client.put(&url).json(input), "/edit-store")
            .await?;
        store_from_row(envelope.store)
    }

    /// Delete a store.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] for unknown ids, or another error
    /// if the request fails.
    #[instrument(skip(self), fields(store_id = %id))]
    pub async fn delete_store(&self, id: StoreId) -> Result<(), BackendError> {
        let url = format!("{}/stores/{id}", self.inner.base_url);
        self.execute_empty(self.inner.client.delete(&url), "/stores")
            .await
    }

    // -------------------------------------------------------------------------
    // Category writes
    // -------------------------------------------------------------------------

    /// Create a category, with an optional image file.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload fails or the backend rejects it.
    #[instrument(skip(self, input, image), fields(name = %input.name))]
    pub async fn create_category(
        &self,
        input: &CategoryInput,
        image: Option<ImageUpload>,
    ) -> Result<Category, BackendError> {
        let url = format!("{}/create-category", self.inner.base_url);
        let form = category_form(input, image)?;
        let envelope: DataEnvelope<serde_json::Value> = self
            .execute(self.inner.client.post(&url).multipart(form), "/create-category")
            .await?;
        category_from_row(envelope.data)
    }

    /// Update a category; `image` replaces the stored one only when present.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] for unknown ids, or another error
    /// if the upload fails.
    #[instrument(skip(self, input, image), fields(category_id = %id))]
    pub async fn update_category(
        &self,
        id: CategoryId,
        input: &CategoryInput,
        image: Option<ImageUpload>,
    ) -> Result<Category, BackendError> {
        let url = format!("{}/update-category/{id}", self.inner.base_url);
        let form = category_form(input, image)?;
        let envelope: DataEnvelope<serde_json::Value> = self
            .execute(self.inner.client.put(&url).multipart(form), "/update-category")
            .await?;
        category_from_row(envelope.data)
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] for unknown ids, or another error
    /// if the request fails.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), BackendError> {
        let url = format!("{}/delete-category/{id}", self.inner.base_url);
        self.execute_empty(self.inner.client.delete(&url), "/delete-category")
            .await
    }

    // -------------------------------------------------------------------------
    // Request plumbing
    // -------------------------------------------------------------------------

    /// Send a request and decode the JSON body.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        context: &'static str,
    ) -> Result<T, BackendError> {
        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(context.to_owned()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }

    /// Send a request and discard the body, checking only the status.
    async fn execute_empty(
        &self,
        request: reqwest::RequestBuilder,
        context: &'static str,
    ) -> Result<(), BackendError> {
        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(context.to_owned()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

// =============================================================================
// Multipart Assembly
// =============================================================================

/// Build the multipart body for a product write.
fn product_form(input: &ProductInput, image: Option<ImageUpload>) -> Result<Form, BackendError> {
    let form = Form::new()
        .text("name", input.name.clone())
        .text("description", input.description.clone().unwrap_or_default())
        .text("price", input.price.to_string())
        .text("stock", input.stock.to_string())
        .text("productsCategoryId", input.category_id.to_string())
        .text("active", if input.active { "1" } else { "0" })
        .text("storeId", input.store_id.to_string());

    attach_image(form, image)
}

/// Build the multipart body for a category write.
fn category_form(input: &CategoryInput, image: Option<ImageUpload>) -> Result<Form, BackendError> {
    let mut form = Form::new().text("name", input.name.clone());
    if let Some(order) = input.order {
        form = form.text("order", order.to_string());
    }

    attach_image(form, image)
}

/// Attach the image file part when one was uploaded.
fn attach_image(form: Form, image: Option<ImageUpload>) -> Result<Form, BackendError> {
    match image {
        Some(image) => {
            let part = Part::bytes(image.bytes)
                .file_name(image.file_name)
                .mime_str(&image.content_type)?;
            Ok(form.part("image", part))
        }
        None => Ok(form),
    }
}

// =============================================================================
// Row Conversion
// =============================================================================

/// Decode and convert rows one at a time, skipping the invalid ones.
fn normalize_rows<R, T>(rows: Vec<serde_json::Value>, kind: &'static str) -> Vec<T>
where
    R: DeserializeOwned + TryInto<T>,
    <R as TryInto<T>>::Error: std::fmt::Display,
{
    rows.into_iter()
        .filter_map(|row| {
            let id = row.get("id").cloned();
            match serde_json::from_value::<R>(row) {
                Ok(record) => match record.try_into() {
                    Ok(entity) => Some(entity),
                    Err(e) => {
                        tracing::warn!(kind, id = ?id, error = %e, "Skipping invalid record");
                        None
                    }
                },
                Err(e) => {
                    tracing::warn!(kind, id = ?id, error = %e, "Skipping malformed record");
                    None
                }
            }
        })
        .collect()
}

/// Decode a single product row; writes echo the stored entity back.
fn product_from_row(row: serde_json::Value) -> Result<Product, BackendError> {
    let record: ProductRecord =
        serde_json::from_value(row).map_err(|e| BackendError::Parse(e.to_string()))?;
    Product::try_from(record).map_err(|e| BackendError::Parse(e.to_string()))
}

/// Decode a single store row.
fn store_from_row(row: serde_json::Value) -> Result<Store, BackendError> {
    let record: StoreRecord =
        serde_json::from_value(row).map_err(|e| BackendError::Parse(e.to_string()))?;
    Store::try_from(record).map_err(|e| BackendError::Parse(e.to_string()))
}

/// Decode a single category row.
fn category_from_row(row: serde_json::Value) -> Result<Category, BackendError> {
    let record: CategoryRecord =
        serde_json::from_value(row).map_err(|e| BackendError::Parse(e.to_string()))?;
    Category::try_from(record).map_err(|e| BackendError::Parse(e.to_string()))
}

// =============================================================================
// Response Envelopes
// =============================================================================

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct StoreEnvelope {
    store: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ProductsPayload {
    products: Vec<serde_json::Value>,
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
struct ProductPayload {
    product: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct StoresPayload {
    stores: Vec<serde_json::Value>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_store_input() -> StoreInput {
        StoreInput {
            name: "Bodega Central".to_owned(),
            address: "Av. Principal #123".to_owned(),
            phone: "956111222".to_owned(),
            description: String::new(),
            state: true,
            all_day: false,
            init: "08:00".to_owned(),
            close: "20:00".to_owned(),
            day_off: Some(0),
            lat: Some(-14.8356),
            long: Some(-74.9399),
        }
    }

    #[test]
    fn test_store_input_uses_wire_key_spellings() {
        let value = serde_json::to_value(sample_store_input()).unwrap();
        let object = value.as_object().unwrap();
        assert!(object.contains_key("state"));
        assert!(object.contains_key("allDay"));
        assert!(object.contains_key("dayOff"));
        assert!(object.contains_key("lat"));
        assert!(object.contains_key("long"));
        assert!(!object.contains_key("active"));
        assert!(!object.contains_key("all_day"));
    }

    #[test]
    fn test_product_from_row_accepts_loose_types() {
        let row = serde_json::json!({
            "id": 7, "name": "Pan Francés", "price": "0.50", "active": 1,
            "productsCategoryId": 2, "storeId": 1
        });
        let product = product_from_row(row).unwrap();
        assert_eq!(product.name, "Pan Francés");
        assert!(product.active);
    }

    #[test]
    fn test_product_from_row_rejects_invalid() {
        let row = serde_json::json!({
            "id": 7, "name": "Pan", "price": -2, "active": 1,
            "productsCategoryId": 2, "storeId": 1
        });
        assert!(matches!(product_from_row(row), Err(BackendError::Parse(_))));
    }

    #[test]
    fn test_normalize_rows_skips_invalid() {
        let rows = vec![
            serde_json::json!({"id": 1, "name": "Bebidas"}),
            serde_json::json!({"id": 2, "name": "   "}),
        ];
        let categories = normalize_rows::<CategoryRecord, Category>(rows, "category");
        assert_eq!(categories.len(), 1);
        assert_eq!(categories.first().unwrap().name, "Bebidas");
    }
}
