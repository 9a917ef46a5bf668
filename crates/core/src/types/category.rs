//! Category entity.

use serde::{Deserialize, Serialize};

use super::id::CategoryId;

/// A product category shown in the storefront's category strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Display position; categories without one sort last.
    #[serde(default)]
    pub order: Option<i32>,
}

impl Category {
    /// Sort key: explicit display order first, then name for stability.
    #[must_use]
    pub fn sort_key(&self) -> (i32, &str) {
        (self.order.unwrap_or(i32::MAX), self.name.as_str())
    }
}

/// Sort categories by display order, then name.
pub fn sort_for_display(categories: &mut [Category]) {
    categories.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}
