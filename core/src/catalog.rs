// grocer/src/catalog.rs

//! Read models for the product catalog and the browsing helpers the product
//! screens use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ProductId = Uuid;
pub type CategoryId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id: ProductId,
  pub name: String,
  /// List price (MRP).
  pub price: f64,
  pub discount_price: Option<f64>,
  pub unit: Option<String>,
  pub category_id: Option<CategoryId>,
  pub is_active: bool,
  pub description: Option<String>,
  pub image_url: Option<String>,
  pub stock: Option<i32>,
  pub created_at: Option<DateTime<Utc>>,
}

impl Product {
  /// A minimal active product with no discount.
  pub fn new(name: impl Into<String>, price: f64) -> Self {
    Self {
      id: Uuid::new_v4(),
      name: name.into(),
      price,
      discount_price: None,
      unit: None,
      category_id: None,
      is_active: true,
      description: None,
      image_url: None,
      stock: None,
      created_at: None,
    }
  }

  pub fn with_discount(mut self, discount_price: f64) -> Self {
    self.discount_price = Some(discount_price);
    self
  }

  pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
    self.unit = Some(unit.into());
    self
  }

  pub fn in_category(mut self, category_id: CategoryId) -> Self {
    self.category_id = Some(category_id);
    self
  }

  /// The discount price when present and lower than the list price,
  /// otherwise the list price.
  pub fn effective_price(&self) -> f64 {
    match self.discount_price {
      Some(discounted) if discounted < self.price => discounted,
      _ => self.price,
    }
  }

  pub fn is_discounted(&self) -> bool {
    self.effective_price() < self.price
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub id: CategoryId,
  pub name: String,
  pub icon: String,
}

/// An in-memory snapshot of the catalog tables.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
  products: Vec<Product>,
  categories: Vec<Category>,
}

impl Catalog {
  pub fn new(products: Vec<Product>, categories: Vec<Category>) -> Self {
    Self { products, categories }
  }

  pub fn categories(&self) -> &[Category] {
    &self.categories
  }

  /// Active products sorted by name, optionally restricted to one category.
  pub fn active_products(&self, category: Option<CategoryId>) -> Vec<&Product> {
    let mut found: Vec<&Product> = self
      .products
      .iter()
      .filter(|p| p.is_active)
      .filter(|p| category.map_or(true, |c| p.category_id == Some(c)))
      .collect();
    found.sort_by(|a, b| a.name.cmp(&b.name));
    found
  }

  /// Case-insensitive substring match on active product names.
  pub fn search(&self, term: &str) -> Vec<&Product> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
      return self.active_products(None);
    }
    self
      .active_products(None)
      .into_iter()
      .filter(|p| p.name.to_lowercase().contains(&needle))
      .collect()
  }
}
