// tests/history_tests.rs
mod common;

use common::*;
use grocer::backend::{Backend, InMemoryBackend};
use grocer::order::NewDeliveryAddress;
use grocer::{AddressInput, CreditsLedger, PlaceOrderOptions, Product};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_order_history_is_newest_first_with_names() {
  setup_tracing();
  let (milk, bread, cheese) = (milk(), bread(), cheese());
  let backend = InMemoryBackend::new().with_catalog(vec![milk.clone(), bread.clone(), cheese.clone()], vec![]);
  let h = harness_with(backend, instant_gateway(), CreditsLedger::new());

  h.session.add_to_cart(milk.clone());
  let first = h.session.place_order(PlaceOrderOptions::new(home_address())).await;
  h.session.add_to_cart(bread.clone());
  h.session.add_to_cart(cheese.clone());
  h.session.update_quantity(cheese.id, 2);
  let second = h.session.place_order(PlaceOrderOptions::new(home_address())).await;
  assert!(first.success && second.success);

  let history = h.session.order_history().await.expect("history loads");

  assert_eq!(history.len(), 2);
  assert_eq!(Some(history[0].order.id), second.order_id);
  assert_eq!(Some(history[1].order.id), first.order_id);

  let names: Vec<&str> = history[0].lines.iter().map(|l| l.name.as_str()).collect();
  assert_eq!(names.len(), 2);
  assert!(names.contains(&"White Bread"));
  assert!(names.contains(&"Cheddar Cheese"));
  let cheese_line = history[0].lines.iter().find(|l| l.name == "Cheddar Cheese").unwrap();
  assert_eq!(cheese_line.quantity, 2);
  assert!(approx_eq(cheese_line.price, 5.49));

  assert_eq!(history[1].lines.len(), 1);
  assert_eq!(history[1].lines[0].name, "Whole Milk 1L");
}

#[tokio::test]
#[serial]
async fn test_order_history_labels_unknown_products() {
  setup_tracing();
  // Catalog is empty, so no product name can be resolved.
  let h = harness();
  h.session.add_to_cart(milk());
  h.session.place_order(PlaceOrderOptions::new(home_address())).await;

  let history = h.session.order_history().await.expect("history loads");

  assert_eq!(history.len(), 1);
  assert_eq!(history[0].lines[0].name, "Item");
}

#[tokio::test]
#[serial]
async fn test_history_and_addresses_are_empty_when_signed_out() {
  setup_tracing();
  let h = harness();
  fill_basic_cart(&h.session);
  h.session.place_order(PlaceOrderOptions::new(home_address()).saving_address()).await;
  h.auth.sign_out();

  assert!(h.session.order_history().await.expect("history loads").is_empty());
  assert!(h.session.saved_addresses().await.expect("addresses load").is_empty());
}

#[tokio::test]
#[serial]
async fn test_saved_addresses_list_defaults_first() {
  setup_tracing();
  let h = harness();
  let office = AddressInput {
    name: "Office".to_string(),
    is_default: false,
    ..home_address()
  };
  let other_user = uuid::Uuid::new_v4();

  h.backend
    .insert_delivery_address(NewDeliveryAddress::from_input(h.user_id, &office))
    .await
    .unwrap();
  h.backend
    .insert_delivery_address(NewDeliveryAddress::from_input(h.user_id, &home_address()))
    .await
    .unwrap();
  h.backend
    .insert_delivery_address(NewDeliveryAddress::from_input(other_user, &home_address()))
    .await
    .unwrap();

  let saved = h.session.saved_addresses().await.expect("addresses load");

  assert_eq!(saved.len(), 2);
  assert_eq!(saved[0].name, "Home");
  assert!(saved[0].is_default);
  assert_eq!(saved[1].name, "Office");

  let refilled = AddressInput::from_saved(&saved[1]);
  assert_eq!(refilled.house, office.house);
  assert_eq!(refilled.street, "");
}

#[tokio::test]
#[serial]
async fn test_catalog_lists_active_products_by_name_and_searches() {
  setup_tracing();
  let dairy = dairy();
  let mut retired = Product::new("Buttermilk", 1.49).in_category(dairy.id);
  retired.is_active = false;
  let products = vec![
    milk().in_category(dairy.id),
    bread(),
    cheese().in_category(dairy.id),
    retired,
  ];
  let backend = InMemoryBackend::new().with_catalog(products, vec![dairy.clone()]);
  let h = harness_with(backend, instant_gateway(), CreditsLedger::new());

  let catalog = h.session.catalog().await.expect("catalog loads");

  assert_eq!(catalog.categories().len(), 1);
  let all: Vec<&str> = catalog.active_products(None).into_iter().map(|p| p.name.as_str()).collect();
  assert_eq!(all, vec!["Cheddar Cheese", "White Bread", "Whole Milk 1L"]);

  let in_dairy: Vec<&str> = catalog
    .active_products(Some(dairy.id))
    .into_iter()
    .map(|p| p.name.as_str())
    .collect();
  assert_eq!(in_dairy, vec!["Cheddar Cheese", "Whole Milk 1L"]);

  let found: Vec<&str> = catalog.search("MILK").into_iter().map(|p| p.name.as_str()).collect();
  assert_eq!(found, vec!["Whole Milk 1L"]);
  assert_eq!(catalog.search("  ").len(), 3);
}
