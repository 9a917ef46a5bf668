//! Category management route handlers.
//!
//! Categories follow the product write shape: multipart forms with an
//! optional image. There is no active flag to toggle.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;

use mercadito_core::{Category, CategoryId};

use crate::error::Result;
use crate::forms::{read_category_form, validate_image};
use crate::state::AppState;

/// Full category listing payload.
#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<Category>,
}

/// Category detail payload.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub category: Category,
}

/// List all categories.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<CategoryListResponse>> {
    let categories = state.backend().categories().await?;
    Ok(Json(CategoryListResponse { categories }))
}

/// Display one category.
#[instrument(skip(state), fields(category_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<CategoryResponse>> {
    let category = state.backend().category(id).await?;
    Ok(Json(CategoryResponse { category }))
}

/// Create a category from a multipart submission.
#[instrument(skip(state, multipart))]
pub async fn create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CategoryResponse>)> {
    let (form, image) = read_category_form(multipart).await?;
    let input = form.into_input()?;
    if let Some(image) = image.as_ref() {
        validate_image(image)?;
    }

    let category = state.backend().create_category(&input, image).await?;
    Ok((StatusCode::CREATED, Json(CategoryResponse { category })))
}

/// Update a category; the stored image is replaced only when a new file was
/// uploaded.
#[instrument(skip(state, multipart), fields(category_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    multipart: Multipart,
) -> Result<Json<CategoryResponse>> {
    let (form, image) = read_category_form(multipart).await?;
    let input = form.into_input()?;
    if let Some(image) = image.as_ref() {
        validate_image(image)?;
    }

    let category = state.backend().update_category(id, &input, image).await?;
    Ok(Json(CategoryResponse { category }))
}

/// Delete a category.
#[instrument(skip(state), fields(category_id = %id))]
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    state.backend().delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
