//! Shopping cart with product snapshots.
//!
//! A cart line stores a copy of the product's name and unit price taken the
//! moment the product was first added, so a later catalog edit does not move
//! a total the shopper has already seen. Lines keep insertion order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Price, Product, ProductId};

/// One product in the cart, with snapshotted name and unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl CartLine {
    /// Line total at the snapshotted unit price.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.unit_price.extended(self.quantity)
    }
}

/// An ordered, quantity-merged cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add one unit of `product`.
    ///
    /// Bumps the quantity when a line for the product already exists,
    /// otherwise appends a new line with quantity 1 and a fresh snapshot.
    pub fn add(&mut self, product: &Product) {
        if let Some(line) = self.line_mut(product.id) {
            line.quantity += 1;
        } else {
            self.lines.push(CartLine {
                product_id: product.id,
                name: product.name.clone(),
                unit_price: product.price,
                quantity: 1,
                image_url: product.image_url.clone(),
            });
        }
    }

    /// Add one unit of a product already in the cart. No-op when absent.
    pub fn increment(&mut self, product_id: ProductId) {
        if let Some(line) = self.line_mut(product_id) {
            line.quantity += 1;
        }
    }

    /// Remove one unit; dropping below one removes the line entirely.
    pub fn decrement(&mut self, product_id: ProductId) {
        if let Some(line) = self.line_mut(product_id) {
            if line.quantity > 1 {
                line.quantity -= 1;
            } else {
                self.remove(product_id);
            }
        }
    }

    /// Remove a line regardless of its quantity. No-op when absent.
    pub fn remove(&mut self, product_id: ProductId) {
        self.lines.retain(|line| line.product_id != product_id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.lines.iter().any(|line| line.product_id == product_id)
    }

    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.lines
            .iter()
            .find(|line| line.product_id == product_id)
            .map_or(0, |line| line.quantity)
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Sum of line totals at snapshotted prices.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::total).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    fn line_mut(&mut self, product_id: ProductId) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{CategoryId, StoreId};

    fn product(id: i64, name: &str, price: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            description: None,
            price: price.parse().unwrap(),
            active: true,
            category_id: CategoryId::new(1),
            store_id: StoreId::new(1),
            image_url: None,
            stock: None,
        }
    }

    #[test]
    fn test_add_twice_merges_into_one_line() {
        let mut cart = Cart::new();
        let pan = product(1, "Pan", "1.00");
        cart.add(&pan);
        cart.add(&pan);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.quantity_of(pan.id), 2);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_decrement_at_one_removes_line() {
        let mut cart = Cart::new();
        let pan = product(1, "Pan", "1.00");
        cart.add(&pan);
        cart.decrement(pan.id);
        assert!(cart.is_empty());
        assert!(!cart.contains(pan.id));
    }

    #[test]
    fn test_decrement_above_one_keeps_line() {
        let mut cart = Cart::new();
        let pan = product(1, "Pan", "1.00");
        cart.add(&pan);
        cart.add(&pan);
        cart.decrement(pan.id);
        assert_eq!(cart.quantity_of(pan.id), 1);
    }

    #[test]
    fn test_increment_missing_product_is_noop() {
        let mut cart = Cart::new();
        cart.increment(ProductId::new(99));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_drops_whole_line() {
        let mut cart = Cart::new();
        let pan = product(1, "Pan", "1.00");
        let leche = product(2, "Leche", "4.50");
        cart.add(&pan);
        cart.add(&pan);
        cart.add(&leche);
        cart.remove(pan.id);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines().first().unwrap().name, "Leche");
    }

    #[test]
    fn test_subtotal_sums_line_totals() {
        let mut cart = Cart::new();
        let pan = product(1, "Pan", "10.50");
        let leche = product(2, "Leche", "4.50");
        cart.add(&pan);
        cart.add(&pan);
        cart.add(&leche);
        assert_eq!(cart.subtotal(), "25.50".parse::<Decimal>().unwrap());
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_snapshot_survives_catalog_edit() {
        let mut cart = Cart::new();
        let mut pan = product(1, "Pan", "1.00");
        cart.add(&pan);
        // Catalog edit after the add must not reprice the line
        pan.price = "9.99".parse().unwrap();
        pan.name = "Pan premium".to_owned();
        cart.increment(pan.id);
        let line = cart.lines().first().unwrap();
        assert_eq!(line.name, "Pan");
        assert_eq!(line.total(), "2.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_lines_keep_insertion_order() {
        let mut cart = Cart::new();
        cart.add(&product(3, "Queso", "8.00"));
        cart.add(&product(1, "Pan", "1.00"));
        cart.add(&product(2, "Leche", "4.50"));
        let names: Vec<_> = cart.lines().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Queso", "Pan", "Leche"]);
    }
}
