// grocer/src/session.rs

//! A shopper's session: the cart and credits ledger it owns, the
//! collaborators it talks to, and the operations the UI layer calls.

use crate::auth::Authenticator;
use crate::backend::Backend;
use crate::cart::{Cart, CartItem};
use crate::catalog::{Catalog, Product, ProductId};
use crate::checkout::{
  build_checkout_pipeline, final_total, CheckoutCtxData, CheckoutOutcome, CheckoutQuote, CheckoutReceipt,
  PlaceOrderOptions, SchemaCapabilities,
};
use crate::credits::{credits_for, credits_value, CreditTransaction, CreditsLedger};
use crate::error::{BackendError, CheckoutError, FlowError};
use crate::flow::{FlowOutcome, Pipeline, Shared};
use crate::order::{DeliveryAddress, OrderLine, OrderSummary};
use crate::payment::PaymentGateway;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The external services a session depends on.
#[derive(Clone)]
pub struct Collaborators {
  pub backend: Arc<dyn Backend>,
  pub gateway: Arc<dyn PaymentGateway>,
  pub auth: Arc<dyn Authenticator>,
}

impl std::fmt::Debug for Collaborators {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Collaborators").finish_non_exhaustive()
  }
}

/// Clears the in-flight flag when a checkout attempt ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
  fn acquire(flag: &'a AtomicBool) -> Option<Self> {
    flag
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .ok()
      .map(|_| InFlight(flag))
  }
}

impl Drop for InFlight<'_> {
  fn drop(&mut self) {
    self.0.store(false, Ordering::Release);
  }
}

#[derive(Debug)]
pub struct Session {
  cart: Shared<Cart>,
  ledger: Shared<CreditsLedger>,
  collaborators: Collaborators,
  schema: Arc<SchemaCapabilities>,
  checkout: Arc<Pipeline<CheckoutCtxData, CheckoutError>>,
  checkout_in_flight: AtomicBool,
}

impl Session {
  /// Starts a session with an empty cart and a ledger holding the welcome
  /// bonus.
  pub fn new(collaborators: Collaborators) -> Self {
    Self::with_ledger(collaborators, CreditsLedger::new())
  }

  pub fn with_ledger(collaborators: Collaborators, ledger: CreditsLedger) -> Self {
    Self {
      cart: Shared::new(Cart::new()),
      ledger: Shared::new(ledger),
      collaborators,
      schema: Arc::new(SchemaCapabilities::default()),
      checkout: Arc::new(build_checkout_pipeline()),
      checkout_in_flight: AtomicBool::new(false),
    }
  }

  pub fn cart(&self) -> &Shared<Cart> {
    &self.cart
  }

  pub fn ledger(&self) -> &Shared<CreditsLedger> {
    &self.ledger
  }

  pub fn schema(&self) -> &SchemaCapabilities {
    &self.schema
  }

  // --- Cart ---

  pub fn items(&self) -> Vec<CartItem> {
    self.cart.read().items().to_vec()
  }

  pub fn total_items(&self) -> u32 {
    self.cart.read().total_items()
  }

  pub fn total_price(&self) -> f64 {
    self.cart.read().total_price()
  }

  pub fn add_to_cart(&self, product: Product) {
    self.cart.write().add_to_cart(product);
  }

  pub fn remove_from_cart(&self, product_id: ProductId) {
    self.cart.write().remove_from_cart(product_id);
  }

  pub fn update_quantity(&self, product_id: ProductId, quantity: i64) {
    self.cart.write().update_quantity(product_id, quantity);
  }

  pub fn clear_cart(&self) {
    self.cart.write().clear();
  }

  // --- Credits ---

  pub fn credits(&self) -> u32 {
    self.ledger.read().balance()
  }

  pub fn transactions(&self) -> Vec<CreditTransaction> {
    self.ledger.read().transactions().to_vec()
  }

  pub fn credits_value(&self, credits: u32) -> f64 {
    credits_value(credits)
  }

  pub fn max_redeemable(&self, cart_total: f64) -> u32 {
    self.ledger.read().max_redeemable(cart_total)
  }

  pub fn earn_credits(&self, order_total: f64, order_id: &str) -> u32 {
    self.ledger.write().earn_credits(order_total, order_id)
  }

  pub fn redeem_credits(&self, amount: u32) -> bool {
    self.ledger.write().redeem_credits(amount)
  }

  /// The Apply / Remove credits toggle: nothing applied applies the
  /// maximum, anything applied removes it.
  pub fn toggle_credits(&self, currently_applied: u32) -> u32 {
    if currently_applied == 0 {
      self.max_redeemable(self.total_price())
    } else {
      0
    }
  }

  /// Totals for the current cart with `credits_to_use` applied. Requests
  /// above the redemption cap are clamped to it.
  pub fn quote(&self, credits_to_use: u32) -> CheckoutQuote {
    let subtotal = self.total_price();
    let max_redeemable = self.max_redeemable(subtotal);
    let credits_to_use = credits_to_use.min(max_redeemable);
    let discount = credits_value(credits_to_use);
    let total = final_total(subtotal, discount);
    CheckoutQuote {
      subtotal,
      max_redeemable,
      credits_to_use,
      discount,
      final_total: total,
      credits_to_earn: credits_for(total),
    }
  }

  // --- Checkout ---

  /// Runs one checkout attempt. Credits for the order are NOT awarded here;
  /// see [`Session::checkout`].
  #[instrument(
    name = "Session::place_order",
    skip_all,
    fields(credits_to_use = options.credits_to_use, payment_method = %options.payment_method)
  )]
  pub async fn place_order(&self, options: PlaceOrderOptions) -> CheckoutOutcome {
    let outcome = CheckoutOutcome::from(self.try_place_order(options).await);
    match &outcome.error {
      None => info!(order_id = ?outcome.order_id, "Order placed."),
      Some(error) => warn!(%error, "Order not placed."),
    }
    outcome
  }

  /// [`Session::place_order`] with the failure kept as a typed error.
  pub async fn try_place_order(&self, options: PlaceOrderOptions) -> Result<CheckoutReceipt, CheckoutError> {
    let _in_flight = InFlight::acquire(&self.checkout_in_flight).ok_or(CheckoutError::InProgress)?;

    let ctx = Shared::new(CheckoutCtxData::new(
      options,
      self.cart.clone(),
      self.ledger.clone(),
      self.collaborators.backend.clone(),
      self.collaborators.gateway.clone(),
      self.collaborators.auth.clone(),
      self.schema.clone(),
    ));

    match self.checkout.run(ctx.clone()).await? {
      FlowOutcome::Completed => {}
      FlowOutcome::Stopped => {
        return Err(CheckoutError::from(FlowError::Internal(
          "checkout halted before completion".to_string(),
        )))
      }
    }

    let guard = ctx.read();
    let order_id = guard
      .order_id
      .ok_or_else(|| CheckoutError::from(FlowError::Internal("checkout completed without an order".to_string())))?;
    Ok(CheckoutReceipt {
      order_id,
      subtotal: guard.subtotal,
      discount: guard.discount,
      final_total: guard.final_total,
      credits_used: guard.credits_redeemed,
      payment_reference: guard.payment_reference.clone(),
      delivery_address_id: guard.delivery_address_id,
    })
  }

  /// Places the order and, on success, awards credits for the paid total.
  pub async fn checkout(&self, options: PlaceOrderOptions) -> CheckoutOutcome {
    let outcome = self.place_order(options).await;
    if let Some(receipt) = &outcome.receipt {
      self.earn_credits(receipt.final_total, &receipt.order_id.to_string());
    }
    outcome
  }

  // --- Catalog, addresses, history ---

  pub async fn catalog(&self) -> Result<Catalog, BackendError> {
    let backend = &self.collaborators.backend;
    let products = backend.list_products().await?;
    let categories = backend.list_categories().await?;
    Ok(Catalog::new(products, categories))
  }

  /// Saved addresses of the signed-in user; empty when signed out.
  pub async fn saved_addresses(&self) -> Result<Vec<DeliveryAddress>, BackendError> {
    match self.collaborators.auth.current_user().await {
      Some(user_id) => self.collaborators.backend.list_delivery_addresses(user_id).await,
      None => Ok(Vec::new()),
    }
  }

  /// The signed-in user's orders, newest first, with product names
  /// resolved. Empty when signed out.
  #[instrument(name = "Session::order_history", skip(self))]
  pub async fn order_history(&self) -> Result<Vec<OrderSummary>, BackendError> {
    let Some(user_id) = self.collaborators.auth.current_user().await else {
      return Ok(Vec::new());
    };
    let backend = &self.collaborators.backend;
    let orders = backend.list_orders(user_id).await?;
    if orders.is_empty() {
      return Ok(Vec::new());
    }

    let order_ids: Vec<_> = orders.iter().map(|o| o.id).collect();
    let items = backend.list_order_items(&order_ids).await?;
    let names: HashMap<ProductId, String> = backend
      .list_products()
      .await?
      .into_iter()
      .map(|p| (p.id, p.name))
      .collect();

    Ok(
      orders
        .into_iter()
        .map(|order| {
          let lines = items
            .iter()
            .filter(|item| item.order_id == order.id)
            .map(|item| OrderLine {
              name: names.get(&item.product_id).cloned().unwrap_or_else(|| "Item".to_string()),
              quantity: item.quantity,
              price: item.price,
            })
            .collect();
          OrderSummary { order, lines }
        })
        .collect(),
    )
  }
}
