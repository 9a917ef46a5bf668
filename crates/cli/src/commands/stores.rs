//! List stores with their open-now state.

use chrono::{Datelike, Timelike};
use tracing::info;

use mercadito_storefront::backend::CatalogClient;
use mercadito_storefront::config::StorefrontConfig;

/// Fetch and print every store, active and inactive.
///
/// # Errors
///
/// Returns an error if configuration is missing or the catalog is
/// unreachable.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    let catalog = CatalogClient::new(&config.backend)?;

    let stores = catalog.stores().await?;
    let now = chrono::Local::now();
    info!(
        "{} stores at {:02}:{:02} local",
        stores.len(),
        now.hour(),
        now.minute()
    );

    for store in &stores {
        let status = if !store.active {
            "inactive"
        } else if store.is_open_at(now.weekday(), now.time()) {
            "open now"
        } else {
            "closed"
        };
        info!("  [{}] {} - {}", store.id, store.name, status);
    }

    Ok(())
}
