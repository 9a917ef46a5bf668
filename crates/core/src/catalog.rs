//! Product visibility filtering and pagination.
//!
//! The storefront shows a product only when the product itself is active and
//! its owning store is active; on top of that sit the optional category
//! filter and the optional search term. The order of those three predicates
//! is fixed. When the backend paginates, the category and term travel as
//! query parameters instead, but the contract is the same.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, Product, StoreId};

/// Shopper-selected filter state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<CategoryId>,
    pub term: Option<String>,
}

impl ProductFilter {
    /// Filter with neither category nor term.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            category: None,
            term: None,
        }
    }

    /// The search term with surrounding whitespace removed.
    ///
    /// A whitespace-only term is equivalent to no term at all.
    #[must_use]
    pub fn normalized_term(&self) -> Option<&str> {
        self.term
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Toggle semantics for the category strip: selecting the already
    /// selected category clears it.
    pub fn toggle_category(&mut self, category: CategoryId) {
        if self.category == Some(category) {
            self.category = None;
        } else {
            self.category = Some(category);
        }
    }
}

/// Apply the visibility rules to a product list.
///
/// Predicates, in fixed order:
/// 1. product active AND owning store in `active_stores`
/// 2. category match, when a category is selected
/// 3. trimmed case-insensitive term against name or description
#[must_use]
pub fn visible_products<'a>(
    products: &'a [Product],
    active_stores: &HashSet<StoreId>,
    filter: &ProductFilter,
) -> Vec<&'a Product> {
    let term = filter.normalized_term();
    products
        .iter()
        .filter(|p| p.active && active_stores.contains(&p.store_id))
        .filter(|p| filter.category.is_none_or(|c| p.category_id == c))
        .filter(|p| term.is_none_or(|t| p.matches_term(t)))
        .collect()
}

/// Pagination block returned by the product list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
}

impl Pagination {
    /// Whether another page can be requested.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

/// One page of products together with its pagination block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}
