//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::{CatalogClient, CatalogError};
use crate::cart_registry::CartRegistry;
use crate::config::StorefrontConfig;
use crate::delivery::SuggestTracker;
use crate::geo::{GeoClient, GeoError};
use crate::pagination::PageGate;

/// Error constructing the shared application state.
#[derive(Debug, thiserror::Error)]
pub enum AppStateError {
    #[error("catalog client: {0}")]
    Catalog(#[from] CatalogError),
    #[error("geo client: {0}")]
    Geo(#[from] GeoError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the backend clients and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: CatalogClient,
    geo: GeoClient,
    carts: CartRegistry,
    suggestions: SuggestTracker,
    pages: PageGate,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the HTTP clients fails to build.
    pub fn new(config: StorefrontConfig) -> Result<Self, AppStateError> {
        let catalog = CatalogClient::new(&config.backend)?;
        let geo = GeoClient::new(&config.geo)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                geo,
                carts: CartRegistry::new(),
                suggestions: SuggestTracker::new(),
                pages: PageGate::new(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog backend client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// Get a reference to the geocoding/routing client.
    #[must_use]
    pub fn geo(&self) -> &GeoClient {
        &self.inner.geo
    }

    /// Get a reference to the session cart registry.
    #[must_use]
    pub fn carts(&self) -> &CartRegistry {
        &self.inner.carts
    }

    /// Get a reference to the address-suggestion sequence tracker.
    #[must_use]
    pub fn suggestions(&self) -> &SuggestTracker {
        &self.inner.suggestions
    }

    /// Get a reference to the per-list "load more" guard.
    #[must_use]
    pub fn pages(&self) -> &PageGate {
        &self.inner.pages
    }
}
