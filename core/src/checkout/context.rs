// grocer/src/checkout/context.rs

use crate::auth::Authenticator;
use crate::backend::Backend;
use crate::cart::{Cart, CartItem};
use crate::checkout::PlaceOrderOptions;
use crate::credits::CreditsLedger;
use crate::flow::Shared;
use crate::order::{AddressId, OrderId, UserId};
use crate::payment::PaymentGateway;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What the session has learned about the backend schema.
///
/// Starts optimistic; flips once the backend reports that `orders` has no
/// `metadata` column, after which orders go out without metadata directly.
#[derive(Debug)]
pub struct SchemaCapabilities {
  order_metadata: AtomicBool,
}

impl Default for SchemaCapabilities {
  fn default() -> Self {
    Self {
      order_metadata: AtomicBool::new(true),
    }
  }
}

impl SchemaCapabilities {
  pub fn order_metadata(&self) -> bool {
    self.order_metadata.load(Ordering::Acquire)
  }

  pub fn disable_order_metadata(&self) {
    self.order_metadata.store(false, Ordering::Release);
  }
}

/// Root context of one checkout attempt.
pub struct CheckoutCtxData {
  pub options: PlaceOrderOptions,

  // Session state and collaborators.
  pub cart: Shared<Cart>,
  pub ledger: Shared<CreditsLedger>,
  pub backend: Arc<dyn Backend>,
  pub gateway: Arc<dyn PaymentGateway>,
  pub auth: Arc<dyn Authenticator>,
  pub schema: Arc<SchemaCapabilities>,

  // Filled in as steps complete.
  pub user_id: Option<UserId>,
  /// Cart lines frozen at validation time.
  pub lines: Vec<CartItem>,
  pub subtotal: f64,
  pub discount: f64,
  pub final_total: f64,
  pub credits_redeemed: u32,
  pub payment_reference: Option<String>,
  pub delivery_address_id: Option<AddressId>,
  pub order_id: Option<OrderId>,
  pub order_items_saved: bool,
}

impl CheckoutCtxData {
  pub fn new(
    options: PlaceOrderOptions,
    cart: Shared<Cart>,
    ledger: Shared<CreditsLedger>,
    backend: Arc<dyn Backend>,
    gateway: Arc<dyn PaymentGateway>,
    auth: Arc<dyn Authenticator>,
    schema: Arc<SchemaCapabilities>,
  ) -> Self {
    Self {
      options,
      cart,
      ledger,
      backend,
      gateway,
      auth,
      schema,
      user_id: None,
      lines: Vec::new(),
      subtotal: 0.0,
      discount: 0.0,
      final_total: 0.0,
      credits_redeemed: 0,
      payment_reference: None,
      delivery_address_id: None,
      order_id: None,
      order_items_saved: false,
    }
  }
}

impl std::fmt::Debug for CheckoutCtxData {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CheckoutCtxData")
      .field("options", &self.options)
      .field("user_id", &self.user_id)
      .field("lines", &self.lines.len())
      .field("subtotal", &self.subtotal)
      .field("final_total", &self.final_total)
      .field("credits_redeemed", &self.credits_redeemed)
      .field("delivery_address_id", &self.delivery_address_id)
      .field("order_id", &self.order_id)
      .finish()
  }
}
