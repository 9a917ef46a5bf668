//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use mercadito_core::catalog::{Pagination, ProductFilter, visible_products};
use mercadito_core::types::{CategoryId, Product, ProductId, StoreId};

use crate::backend::{DEFAULT_PAGE_SIZE, ProductQuery};
use crate::error::{AppError, Result};
use crate::routes::cart::cart_key;
use crate::state::AppState;

/// Product list query parameters.
#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<CategoryId>,
    pub term: Option<String>,
    pub store: Option<StoreId>,
}

impl From<ProductListQuery> for ProductQuery {
    fn from(query: ProductListQuery) -> Self {
        Self {
            page: query.page.unwrap_or(1).max(1),
            limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100),
            category: query.category,
            term: query.term,
            store: query.store,
        }
    }
}

/// One page of visible products.
#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

/// Product detail payload.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub product: Product,
}

/// List visible products, paginated.
///
/// Category and search term travel to the backend as query parameters; store
/// activity is applied here against the stores list because the product
/// endpoint does not join stores. One page per list may be loading at a time
/// per session; a concurrent request for the same list is rejected with a
/// conflict so "load more" never double-fires.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ProductListResponse>> {
    let query = ProductQuery::from(query);
    let session_key = cart_key(&session).await?;

    // Held until this handler returns, including the error paths.
    let _token = state
        .pages()
        .begin(session_key, &query.list_signature())
        .ok_or(AppError::PageInFlight)?;

    let (page, active_stores) = tokio::join!(
        state.catalog().products(&query),
        state.catalog().active_store_ids()
    );
    let page = page?;
    let active_stores = active_stores?;

    let products = visible_products(&page.products, &active_stores, &ProductFilter::none())
        .into_iter()
        .cloned()
        .collect();

    Ok(Json(ProductListResponse {
        products,
        pagination: page.pagination,
    }))
}

/// Display one product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductResponse>> {
    let product = state.catalog().product(id).await?;
    Ok(Json(ProductResponse { product }))
}
