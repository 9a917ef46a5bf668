//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::AdminClient;
use crate::config::AdminConfig;

/// Application state shared across all handlers.
///
/// Cheap to clone; the fields live behind one [`Arc`].
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    backend: AdminClient,
}

impl AppState {
    pub fn new(config: AdminConfig, backend: AdminClient) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, backend }),
        }
    }

    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    pub fn backend(&self) -> &AdminClient {
        &self.inner.backend
    }
}
