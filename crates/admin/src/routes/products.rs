//! Product management route handlers.
//!
//! Writes arrive as multipart forms so an image file can ride along with the
//! fields; both go out to the backend in the same shape.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use mercadito_core::catalog::Pagination;
use mercadito_core::{Product, ProductId};

use crate::backend::ProductInput;
use crate::error::Result;
use crate::forms::{read_product_form, validate_image};
use crate::state::AppState;

/// Default and maximum page size for the management listing.
const PAGE_SIZE_LIMIT: u32 = 100;

/// Product list query parameters.
#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ProductListQuery {
    fn page_params(&self) -> (u32, u32) {
        (
            self.page.unwrap_or(1).max(1),
            self.limit.unwrap_or(PAGE_SIZE_LIMIT).clamp(1, PAGE_SIZE_LIMIT),
        )
    }
}

/// One page of products, inactive ones included.
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

/// List products, paginated.
///
/// No visibility filtering here: the management UI needs to see inactive
/// products and products in inactive stores.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ProductListResponse>> {
    let (page, limit) = query.page_params();
    let page = state.backend().products(page, limit).await?;
    Ok(Json(ProductListResponse {
        products: page.products,
        pagination: page.pagination,
    }))
}

/// Display one product.
#[instrument(skip(state), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductResponse>> {
    let product = state.backend().product(id).await?;
    Ok(Json(ProductResponse { product }))
}

/// Create a product from a multipart submission.
#[instrument(skip(state, multipart))]
pub async fn create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    let (form, image) = read_product_form(multipart).await?;
    let input = form.into_input()?;
    if let Some(image) = image.as_ref() {
        validate_image(image)?;
    }

    let product = state.backend().create_product(&input, image).await?;
    Ok((StatusCode::CREATED, Json(ProductResponse { product })))
}

/// Update a product; the stored image is replaced only when a new file was
/// uploaded.
#[instrument(skip(state, multipart), fields(product_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Json<ProductResponse>> {
    let (form, image) = read_product_form(multipart).await?;
    let input = form.into_input()?;
    if let Some(image) = image.as_ref() {
        validate_image(image)?;
    }

    let product = state.backend().update_product(id, &input, image).await?;
    Ok(Json(ProductResponse { product }))
}

/// Delete a product.
#[instrument(skip(state), fields(product_id = %id))]
pub async fn destroy(State(state): State<AppState>, Path(id): Path<ProductId>) -> Result<StatusCode> {
    state.backend().delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Flip a product's active flag.
///
/// The backend has no partial update, so this fetches the product and
/// re-submits every field with the flag inverted and no image.
#[instrument(skip(state), fields(product_id = %id))]
pub async fn toggle(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductResponse>> {
    let product = state.backend().product(id).await?;
    let input = ProductInput {
        name: product.name,
        description: product.description,
        price: product.price.amount(),
        // Rows without a stock value resubmit as zero.
        stock: product.stock.unwrap_or_default(),
        category_id: product.category_id,
        store_id: product.store_id,
        active: !product.active,
    };

    let product = state.backend().update_product(id, &input, None).await?;
    Ok(Json(ProductResponse { product }))
}
