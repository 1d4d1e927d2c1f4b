// grocer/src/cart.rs

//! The cart aggregate. Totals are always derived from the current lines.

use crate::catalog::{Product, ProductId};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartItem {
  pub product: Product,
  /// Always at least 1; a line that would drop to 0 is removed instead.
  pub quantity: u32,
}

impl CartItem {
  pub fn line_total(&self) -> f64 {
    self.product.effective_price() * f64::from(self.quantity)
  }
}

/// At most one line per product id. Lines keep insertion order for display.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Cart {
  items: Vec<CartItem>,
}

impl Cart {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn items(&self) -> &[CartItem] {
    &self.items
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn quantity_of(&self, product_id: ProductId) -> u32 {
    self
      .items
      .iter()
      .find(|item| item.product.id == product_id)
      .map_or(0, |item| item.quantity)
  }

  /// Adds one unit of `product`, creating the line if needed.
  pub fn add_to_cart(&mut self, product: Product) {
    match self.items.iter_mut().find(|item| item.product.id == product.id) {
      Some(existing) => existing.quantity = existing.quantity.saturating_add(1),
      None => self.items.push(CartItem { product, quantity: 1 }),
    }
  }

  pub fn remove_from_cart(&mut self, product_id: ProductId) {
    self.items.retain(|item| item.product.id != product_id);
  }

  /// Sets the quantity of an existing line. Zero or less removes the line;
  /// anything above `u32::MAX` is clamped to it.
  pub fn update_quantity(&mut self, product_id: ProductId, quantity: i64) {
    if quantity <= 0 {
      self.remove_from_cart(product_id);
      return;
    }
    let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
    if let Some(item) = self.items.iter_mut().find(|item| item.product.id == product_id) {
      item.quantity = quantity;
    }
  }

  pub fn clear(&mut self) {
    self.items.clear();
  }

  /// Saturates at `u32::MAX`.
  pub fn total_items(&self) -> u32 {
    self.items.iter().fold(0u32, |total, item| total.saturating_add(item.quantity))
  }

  pub fn total_price(&self) -> f64 {
    self.items.iter().map(CartItem::line_total).sum()
  }
}
