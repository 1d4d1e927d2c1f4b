// grocer/app/src/demo.rs

//! A scripted shopper: browse, fill the cart, apply credits, check out, then
//! look at the order history.

use crate::errors::Result as AppResult;
use futures_util::future::try_join;
use grocer::{format_amount, AddressInput, PaymentMethod, PlaceOrderOptions, Session};
use tracing::{info, instrument, warn};

fn demo_address() -> AddressInput {
  AddressInput {
    name: "Home".to_string(),
    receiver_name: "Demo Shopper".to_string(),
    phone: "5550100".to_string(),
    house: "123 Main Street, Apt 4B".to_string(),
    street: "Near Central Park".to_string(),
    city: "Springfield".to_string(),
    state: "IL".to_string(),
    pincode: "62701".to_string(),
    is_default: true,
  }
}

#[instrument(name = "demo::run", skip_all)]
pub async fn run(session: &Session) -> AppResult<()> {
  let (catalog, saved) = try_join(session.catalog(), session.saved_addresses()).await?;
  info!(
    categories = catalog.categories().len(),
    products = catalog.active_products(None).len(),
    saved_addresses = saved.len(),
    "Catalog loaded."
  );

  for product in catalog.search("milk").into_iter().chain(catalog.active_products(None).into_iter().take(3)) {
    session.add_to_cart(product.clone());
  }
  if let Some(first) = session.items().first() {
    session.update_quantity(first.product.id, 2);
  }
  info!(
    items = session.total_items(),
    total = %format_amount(session.total_price()),
    "Cart filled."
  );

  let credits_to_use = session.toggle_credits(0);
  let quote = session.quote(credits_to_use);
  info!(quote = %serde_json::to_string(&quote).unwrap_or_default(), "Quote.");

  // Reuse the first saved address if there is one, otherwise save a new one.
  let options = match saved.first() {
    Some(address) => PlaceOrderOptions::new(AddressInput::from_saved(address)).using_saved_address(address.id),
    None => PlaceOrderOptions::new(demo_address()).saving_address(),
  }
  .with_credits(quote.credits_to_use)
  .paying_with(PaymentMethod::Card);

  let outcome = session.checkout(options).await;
  info!(outcome = %serde_json::to_string(&outcome).unwrap_or_default(), "Checkout finished.");
  info!(
    balance = session.credits(),
    value = %format_amount(session.credits_value(session.credits())),
    transactions = session.transactions().len(),
    "Credits."
  );

  // An empty cart is refused without touching the backend.
  let refused = session.place_order(PlaceOrderOptions::new(demo_address())).await;
  if let Some(error) = &refused.error {
    warn!(%error, "Second checkout refused as expected.");
  }

  for summary in session.order_history().await? {
    info!(
      order_id = %summary.order.id,
      status = summary.order.status.as_str(),
      total = %format_amount(summary.order.total_amount),
      lines = summary.lines.len(),
      "Order history entry."
    );
  }
  Ok(())
}
