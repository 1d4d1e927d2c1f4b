// tests/cart_tests.rs
mod common;

use common::*;
use grocer::{Cart, Product};

#[test]
fn test_add_to_cart_increments_existing_line() {
  let mut cart = Cart::new();
  let milk = milk();
  cart.add_to_cart(milk.clone());
  cart.add_to_cart(milk.clone());

  assert_eq!(cart.items().len(), 1);
  assert_eq!(cart.quantity_of(milk.id), 2);
}

#[test]
fn test_add_to_cart_appends_new_lines_in_order() {
  let mut cart = Cart::new();
  let (milk, bread) = (milk(), bread());
  cart.add_to_cart(milk.clone());
  cart.add_to_cart(bread.clone());

  let ids: Vec<_> = cart.items().iter().map(|i| i.product.id).collect();
  assert_eq!(ids, vec![milk.id, bread.id]);
}

#[test]
fn test_totals_for_two_milks_and_a_bread() {
  let mut cart = Cart::new();
  let milk = milk();
  cart.add_to_cart(milk.clone());
  cart.add_to_cart(milk);
  cart.add_to_cart(bread());

  assert!(approx_eq(cart.total_price(), 10.97), "got {}", cart.total_price());
  assert_eq!(cart.total_items(), 3);
}

#[test]
fn test_totals_use_effective_price() {
  let mut cart = Cart::new();
  let cheese = cheese();
  cart.add_to_cart(cheese.clone());
  cart.update_quantity(cheese.id, 2);

  assert!(approx_eq(cart.total_price(), 10.98));
  assert!(approx_eq(cart.items()[0].line_total(), 10.98));
}

#[test]
fn test_discount_price_above_list_price_is_ignored() {
  let odd = Product::new("Odd Pricing", 2.00).with_discount(2.50);
  assert!(approx_eq(odd.effective_price(), 2.00));
  assert!(!odd.is_discounted());
}

#[test]
fn test_update_quantity_sets_exact_value() {
  let mut cart = Cart::new();
  let milk = milk();
  cart.add_to_cart(milk.clone());
  cart.update_quantity(milk.id, 5);
  cart.update_quantity(milk.id, 3);

  assert_eq!(cart.quantity_of(milk.id), 3);
  assert_eq!(cart.total_items(), 3);
}

#[test]
fn test_update_quantity_zero_is_remove() {
  let (milk, bread) = (milk(), bread());
  let mut updated = Cart::new();
  let mut removed = Cart::new();
  for cart in [&mut updated, &mut removed] {
    cart.add_to_cart(milk.clone());
    cart.add_to_cart(bread.clone());
  }

  updated.update_quantity(milk.id, 0);
  removed.remove_from_cart(milk.id);

  let ids = |c: &Cart| c.items().iter().map(|i| i.product.id).collect::<Vec<_>>();
  assert_eq!(ids(&updated), ids(&removed));
  assert_eq!(updated.total_items(), removed.total_items());
}

#[test]
fn test_update_quantity_negative_removes_line() {
  let mut cart = Cart::new();
  let milk = milk();
  cart.add_to_cart(milk.clone());
  cart.update_quantity(milk.id, -3);
  assert!(cart.is_empty());
}

#[test]
fn test_update_quantity_of_unknown_product_is_noop() {
  let mut cart = Cart::new();
  cart.add_to_cart(milk());
  cart.update_quantity(bread().id, 4);
  assert_eq!(cart.items().len(), 1);
  assert_eq!(cart.total_items(), 1);
}

#[test]
fn test_large_quantities_saturate_instead_of_overflowing() {
  let mut cart = Cart::new();
  let (milk, bread) = (milk(), bread());
  cart.add_to_cart(milk.clone());
  cart.add_to_cart(bread.clone());

  cart.update_quantity(milk.id, i64::MAX);
  assert_eq!(cart.quantity_of(milk.id), u32::MAX);
  cart.add_to_cart(milk.clone());
  assert_eq!(cart.quantity_of(milk.id), u32::MAX);

  cart.update_quantity(milk.id, 3_000_000_000);
  cart.update_quantity(bread.id, 3_000_000_000);
  assert_eq!(cart.total_items(), u32::MAX);
  assert!(cart.total_price().is_finite());
}

#[test]
fn test_remove_absent_product_is_noop_and_clear_empties() {
  let mut cart = Cart::new();
  cart.add_to_cart(milk());
  cart.remove_from_cart(bread().id);
  assert_eq!(cart.total_items(), 1);

  cart.clear();
  assert!(cart.is_empty());
  assert_eq!(cart.total_items(), 0);
  assert!(approx_eq(cart.total_price(), 0.0));
}

#[test]
fn test_totals_are_recomputed_after_every_mutation() {
  let mut cart = Cart::new();
  let (milk, bread, cheese) = (milk(), bread(), cheese());
  cart.add_to_cart(milk.clone());
  cart.add_to_cart(bread.clone());
  cart.add_to_cart(cheese.clone());
  cart.update_quantity(bread.id, 4);
  cart.remove_from_cart(milk.id);

  let expected: f64 = cart
    .items()
    .iter()
    .map(|i| i.product.effective_price() * f64::from(i.quantity))
    .sum();
  let expected_items: u32 = cart.items().iter().map(|i| i.quantity).sum();
  assert!(approx_eq(cart.total_price(), expected));
  assert_eq!(cart.total_items(), expected_items);
  assert_eq!(cart.total_items(), 5);
}
