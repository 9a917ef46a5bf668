//! Product entity.

use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId, StoreId};
use super::price::Price;

/// A catalog product, normalized from a backend record.
///
/// A product is visible to shoppers only when its own `active` flag is true
/// AND its owning store is active; the second half of that rule lives in
/// [`crate::catalog::visible_products`] because it needs store data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    pub active: bool,
    pub category_id: CategoryId,
    pub store_id: StoreId,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Units on hand; `None` when the backend leaves stock unspecified.
    #[serde(default)]
    pub stock: Option<u32>,
}

impl Product {
    /// Case-insensitive substring match of `term` against name or description.
    ///
    /// The caller is expected to have trimmed the term; an empty term matches
    /// everything.
    #[must_use]
    pub fn matches_term(&self, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        let needle = term.to_lowercase();
        if self.name.to_lowercase().contains(&needle) {
            return true;
        }
        self.description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(name: &str, description: Option<&str>) -> Product {
        Product {
            id: ProductId::new(1),
            name: name.to_owned(),
            description: description.map(str::to_owned),
            price: "5.00".parse().unwrap(),
            active: true,
            category_id: CategoryId::new(1),
            store_id: StoreId::new(1),
            image_url: None,
            stock: None,
        }
    }

    #[test]
    fn test_matches_term_name_case_insensitive() {
        let p = product("Pan Francés", None);
        assert!(p.matches_term("pan"));
        assert!(p.matches_term("FRANCÉS"));
        assert!(!p.matches_term("torta"));
    }

    #[test]
    fn test_matches_term_description() {
        let p = product("Gaseosa", Some("Botella de 3 litros"));
        assert!(p.matches_term("botella"));
        assert!(!p.matches_term("lata"));
    }

    #[test]
    fn test_empty_term_matches_everything() {
        assert!(product("Arroz", None).matches_term(""));
    }

    #[test]
    fn test_missing_description_is_not_a_match() {
        assert!(!product("Arroz", None).matches_term("extra"));
    }
}
