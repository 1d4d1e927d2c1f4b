// grocer/app/src/seed.rs

//! Sample catalog for the demo: the storefront's category list plus a
//! handful of products in each.

use grocer::{Category, Product};
use uuid::Uuid;

const CATEGORIES: &[(&str, &str)] = &[
  ("Dairy", "🥛"),
  ("Beverages", "🥤"),
  ("Snacks", "🍿"),
  ("Cereals", "🥣"),
  ("Canned Goods", "🥫"),
  ("Frozen Foods", "🧊"),
  ("Bakery", "🍞"),
  ("Condiments", "🧂"),
];

// (category, name, price, discount price, unit)
const PRODUCTS: &[(&str, &str, f64, Option<f64>, &str)] = &[
  ("Dairy", "Whole Milk", 3.99, None, "1 L"),
  ("Dairy", "Greek Yogurt", 4.49, Some(3.99), "500 g"),
  ("Dairy", "Cheddar Cheese", 6.99, Some(5.49), "200 g"),
  ("Beverages", "Orange Juice", 4.29, None, "1 L"),
  ("Beverages", "Sparkling Water", 1.19, None, "750 ml"),
  ("Snacks", "Salted Potato Chips", 2.79, Some(2.29), "150 g"),
  ("Snacks", "Roasted Almonds", 7.49, None, "250 g"),
  ("Cereals", "Rolled Oats", 3.49, None, "1 kg"),
  ("Cereals", "Corn Flakes", 4.99, Some(4.25), "500 g"),
  ("Canned Goods", "Chickpeas", 1.29, None, "400 g"),
  ("Canned Goods", "Diced Tomatoes", 1.49, None, "400 g"),
  ("Frozen Foods", "Frozen Peas", 2.49, None, "1 kg"),
  ("Frozen Foods", "Margherita Pizza", 5.99, Some(4.99), "1 pc"),
  ("Bakery", "White Bread", 2.99, None, "400 g"),
  ("Bakery", "Butter Croissants", 4.79, None, "4 pcs"),
  ("Condiments", "Tomato Ketchup", 2.59, None, "500 g"),
  ("Condiments", "Sea Salt", 1.99, None, "1 kg"),
];

pub fn sample_catalog() -> (Vec<Category>, Vec<Product>) {
  let categories: Vec<Category> = CATEGORIES
    .iter()
    .map(|(name, icon)| Category {
      id: Uuid::new_v4(),
      name: (*name).to_string(),
      icon: (*icon).to_string(),
    })
    .collect();

  let products = PRODUCTS
    .iter()
    .map(|(category, name, price, discount, unit)| {
      let mut product = Product::new(*name, *price).with_unit(*unit);
      if let Some(discount) = discount {
        product = product.with_discount(*discount);
      }
      match categories.iter().find(|c| c.name == *category) {
        Some(c) => product.in_category(c.id),
        None => product,
      }
    })
    .collect();

  (categories, products)
}
