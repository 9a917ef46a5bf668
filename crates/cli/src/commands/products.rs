//! Browse the catalog the way the storefront does.

use tracing::info;

use mercadito_core::{CategoryId, StoreId};
use mercadito_storefront::backend::{CatalogClient, ProductQuery};
use mercadito_storefront::config::StorefrontConfig;

/// Fetch and print one page of products.
///
/// # Errors
///
/// Returns an error if configuration is missing or the catalog is
/// unreachable.
pub async fn run(
    page: u32,
    limit: u32,
    category: Option<i64>,
    term: Option<String>,
    store: Option<i64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    let catalog = CatalogClient::new(&config.backend)?;

    let query = ProductQuery {
        page,
        limit,
        category: category.map(CategoryId::new),
        term,
        store: store.map(StoreId::new),
    };
    let result = catalog.products(&query).await?;
    let pagination = &result.pagination;

    info!(
        "{} products (page {} of {}, {} total)",
        result.products.len(),
        pagination.page,
        pagination.total_pages,
        pagination.total
    );

    for product in &result.products {
        let inactive = if product.active { "" } else { " (inactive)" };
        info!(
            "  [{}] {} - ${}{}",
            product.id, product.name, product.price, inactive
        );
    }
    if pagination.has_more() {
        info!("More pages available; pass --page {}", pagination.page + 1);
    }

    Ok(())
}
