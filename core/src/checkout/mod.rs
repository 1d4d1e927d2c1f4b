// grocer/src/checkout/mod.rs

//! Checkout orchestration.
//!
//! A checkout attempt runs as a [`Pipeline`](crate::flow::Pipeline) over
//! [`CheckoutCtxData`]: validate, redeem credits, collect payment, save the
//! delivery address, persist the order, persist its items, clear the cart.
//! Credit redemption and order creation carry compensations, so a failure
//! further down refunds the credits and deletes the half-written order.

pub mod context;
pub mod pipeline;

pub use context::{CheckoutCtxData, SchemaCapabilities};
pub use pipeline::{build_checkout_pipeline, steps};

use crate::error::CheckoutError;
use crate::order::{AddressId, AddressInput, OrderId};
use crate::payment::PaymentMethod;
use serde::Serialize;

/// What the shopper chose on the cart screen.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceOrderOptions {
  pub address: AddressInput,
  pub credits_to_use: u32,
  pub payment_method: PaymentMethod,
  /// Persist `address` as a new saved address.
  pub save_address: bool,
  /// A previously saved address picked from the list; reused as-is.
  pub saved_address_id: Option<AddressId>,
}

impl PlaceOrderOptions {
  pub fn new(address: AddressInput) -> Self {
    Self {
      address,
      credits_to_use: 0,
      payment_method: PaymentMethod::Cod,
      save_address: false,
      saved_address_id: None,
    }
  }

  pub fn with_credits(mut self, credits: u32) -> Self {
    self.credits_to_use = credits;
    self
  }

  pub fn paying_with(mut self, method: PaymentMethod) -> Self {
    self.payment_method = method;
    self
  }

  pub fn saving_address(mut self) -> Self {
    self.save_address = true;
    self
  }

  pub fn using_saved_address(mut self, id: AddressId) -> Self {
    self.saved_address_id = Some(id);
    self
  }

  pub(crate) fn needs_address_insert(&self) -> bool {
    self.save_address && self.saved_address_id.is_none()
  }
}

/// A completed checkout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutReceipt {
  pub order_id: OrderId,
  pub subtotal: f64,
  pub discount: f64,
  pub final_total: f64,
  pub credits_used: u32,
  pub payment_reference: Option<String>,
  pub delivery_address_id: Option<AddressId>,
}

/// The result shape handed to the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutOutcome {
  pub success: bool,
  pub order_id: Option<OrderId>,
  pub error: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub receipt: Option<CheckoutReceipt>,
}

impl From<Result<CheckoutReceipt, CheckoutError>> for CheckoutOutcome {
  fn from(result: Result<CheckoutReceipt, CheckoutError>) -> Self {
    match result {
      Ok(receipt) => CheckoutOutcome {
        success: true,
        order_id: Some(receipt.order_id),
        error: None,
        receipt: Some(receipt),
      },
      Err(e) => CheckoutOutcome {
        success: false,
        order_id: None,
        error: Some(e.to_string()),
        receipt: None,
      },
    }
  }
}

/// Totals shown on the cart screen before the shopper commits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CheckoutQuote {
  pub subtotal: f64,
  pub max_redeemable: u32,
  pub credits_to_use: u32,
  pub discount: f64,
  pub final_total: f64,
  /// Credits the final total would earn once paid.
  pub credits_to_earn: u32,
}

/// `max(0, subtotal - discount)`.
pub fn final_total(subtotal: f64, discount: f64) -> f64 {
  (subtotal - discount).max(0.0)
}

/// Two-decimal rendering for display. Calculations never round.
pub fn format_amount(amount: f64) -> String {
  format!("{amount:.2}")
}
