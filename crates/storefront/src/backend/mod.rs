//! Catalog backend REST client.
//!
//! Wraps the backend's read endpoints with `reqwest` 0.13 and caches stores,
//! categories, and browse pages using `moka` (5-minute TTL). Search results
//! are never cached. Loose backend rows are normalized by
//! [`mercadito_core::records`]; rows that fail validation are skipped with a
//! warning instead of failing the whole response.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use mercadito_core::catalog::{Pagination, ProductPage};
use mercadito_core::records::{CategoryRecord, ProductRecord, StoreRecord};
use mercadito_core::{Category, CategoryId, Product, ProductId, Store, StoreId};

use crate::config::BackendConfig;

/// Request timeout for catalog calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default page size for product listings.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Errors that can occur when talking to the catalog backend.
#[derive(Debug, Error)]
pub enum CatalogError {
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

impl CatalogError {
    /// Whether retrying the same request later could succeed.
    ///
    /// Transport failures and backend 5xx responses are retryable; missing
    /// resources and malformed payloads are not.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::NotFound(_) | Self::Parse(_) => false,
        }
    }
}

/// Parameters for the product list endpoint.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub page: u32,
    pub limit: u32,
    pub category: Option<CategoryId>,
    pub term: Option<String>,
    pub store: Option<StoreId>,
}

impl ProductQuery {
    /// First page with the default page size and no filters.
    #[must_use]
    pub const fn first_page() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            category: None,
            term: None,
            store: None,
        }
    }

    /// The search term, if non-empty after trimming.
    #[must_use]
    pub fn normalized_term(&self) -> Option<&str> {
        self.term
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Identity of the list this query pages through: the filters, not the
    /// page number. Used to reject concurrent "load more" calls.
    #[must_use]
    pub fn list_signature(&self) -> String {
        format!(
            "c{}:s{}:t{}",
            self.category.map_or_else(|| "-".to_owned(), |c| c.to_string()),
            self.store.map_or_else(|| "-".to_owned(), |s| s.to_string()),
            self.normalized_term().unwrap_or(""),
        )
    }

    /// Cache key for this query; only meaningful when no term is present.
    fn cache_key(&self) -> String {
        format!(
            "products:p{}:l{}:c{}:s{}",
            self.page,
            self.limit,
            self.category.map_or_else(|| "-".to_owned(), |c| c.to_string()),
            self.store.map_or_else(|| "-".to_owned(), |s| s.to_string()),
        )
    }
}

#[derive(Clone)]
enum CacheValue {
    Stores(Vec<Store>),
    Categories(Vec<Category>),
    Page(ProductPage),
    Product(Box<Product>),
}

/// Client for the catalog backend read endpoints.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<String, CacheValue>,
}

impl CatalogClient {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    /// Fetch all stores.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; individual invalid rows are
    /// skipped, not errors.
    #[instrument(skip(self))]
    pub async fn stores(&self) -> Result<Vec<Store>, CatalogError> {
        let cache_key = "stores".to_owned();

        if let Some(CacheValue::Stores(stores)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for stores");
            return Ok(stores);
        }

        let envelope: DataEnvelope<StoresPayload> = self.get_json("/stores", &[]).await?;
        let stores = normalize_rows::<StoreRecord, Store>(envelope.data.stores, "store");

        self.inner
            .cache
            .insert(cache_key, CacheValue::Stores(stores.clone()))
            .await;

        Ok(stores)
    }

    /// Ids of currently active stores, for visibility filtering.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fetch fails.
    pub async fn active_store_ids(&self) -> Result<std::collections::HashSet<StoreId>, CatalogError> {
        Ok(self
            .stores()
            .await?
            .iter()
            .filter(|store| store.active)
            .map(|store| store.id)
            .collect())
    }

    /// Fetch all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        let cache_key = "categories".to_owned();

        if let Some(CacheValue::Categories(categories)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        // Unlike the other endpoints, this one returns a bare array.
        let rows: Vec<serde_json::Value> = self.get_json("/categories", &[]).await?;
        let categories = normalize_rows::<CategoryRecord, Category>(rows, "category");

        self.inner
            .cache
            .insert(cache_key, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    /// Fetch one page of products.
    ///
    /// Pages without a search term are cached; search results always go to
    /// the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(page = query.page, term = ?query.normalized_term()))]
    pub async fn products(&self, query: &ProductQuery) -> Result<ProductPage, CatalogError> {
        let term = query.normalized_term().map(str::to_owned);
        let cache_key = query.cache_key();

        if term.is_none()
            && let Some(CacheValue::Page(page)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for products page");
            return Ok(page);
        }

        let mut params: Vec<(&str, String)> = vec![
            ("page", query.page.to_string()),
            ("limit", query.limit.to_string()),
        ];
        if let Some(category) = query.category {
            params.push(("productsCategoryId", category.to_string()));
        }
        if let Some(ref term) = term {
            params.push(("term", term.clone()));
        }
        if let Some(store) = query.store {
            params.push(("storeId", store.to_string()));
        }

        let envelope: DataEnvelope<ProductsPayload> = self.get_json("/products", &params).await?;
        let page = ProductPage {
            products: normalize_rows::<ProductRecord, Product>(envelope.data.products, "product"),
            pagination: envelope.data.pagination,
        };

        if term.is_none() {
            self.inner
                .cache
                .insert(cache_key, CacheValue::Page(page.clone()))
                .await;
        }

        Ok(page)
    }

    /// Fetch a single product by id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for unknown ids, or another error
    /// if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let cache_key = format!("product:{id}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let envelope: DataEnvelope<ProductPayload> =
            self.get_json(&format!("/product/{id}"), &[]).await?;
        let record: ProductRecord = serde_json::from_value(envelope.data.product)
            .map_err(|e| CatalogError::Parse(e.to_string()))?;
        let product =
            Product::try_from(record).map_err(|e| CatalogError::Parse(e.to_string()))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Cheap backend connectivity probe for the readiness endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or unhealthy.
    pub async fn ping(&self) -> Result<(), CatalogError> {
        let url = format!("{}/categories", self.inner.base_url);
        let response = self.inner.client.get(&url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(CatalogError::Api {
                status: status.as_u16(),
                message: "readiness probe failed".to_owned(),
            })
        }
    }

    /// Execute a GET and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}{path}", self.inner.base_url);
        let mut request = self.inner.client.get(&url);
        if !params.is_empty() {
            request = request.query(params);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(path.to_owned()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))
    }
}

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

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct StoresPayload {
    stores: Vec<serde_json::Value>,
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let api_500 = CatalogError::Api {
            status: 500,
            message: String::new(),
        };
        let api_422 = CatalogError::Api {
            status: 422,
            message: String::new(),
        };
        assert!(api_500.is_retryable());
        assert!(!api_422.is_retryable());
        assert!(!CatalogError::NotFound("/product/9".to_owned()).is_retryable());
        assert!(!CatalogError::Parse("bad json".to_owned()).is_retryable());
    }

    #[test]
    fn test_product_query_cache_key_ignores_term() {
        let mut query = ProductQuery::first_page();
        query.category = Some(CategoryId::new(4));
        let without_term = query.cache_key();
        query.term = Some("pan".to_owned());
        assert_eq!(query.cache_key(), without_term);
    }

    #[test]
    fn test_normalize_rows_skips_invalid() {
        let rows = vec![
            serde_json::json!({"id": 1, "name": "Pan", "price": "1.50", "active": 1,
                               "productsCategoryId": 2, "storeId": 1}),
            serde_json::json!({"id": 2, "name": "Leche", "price": -4, "active": 1,
                               "productsCategoryId": 2, "storeId": 1}),
            serde_json::json!({"id": "not-a-number"}),
        ];
        let products = normalize_rows::<ProductRecord, Product>(rows, "product");
        assert_eq!(products.len(), 1);
        assert_eq!(products.first().unwrap().name, "Pan");
    }

    #[test]
    fn test_normalized_term_trims_and_drops_empty() {
        let mut query = ProductQuery::first_page();
        query.term = Some("  ".to_owned());
        assert_eq!(query.normalized_term(), None);
        query.term = Some(" pan ".to_owned());
        assert_eq!(query.normalized_term(), Some("pan"));
    }
}
