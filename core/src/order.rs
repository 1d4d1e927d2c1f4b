// grocer/src/order.rs

//! Order, order-item and delivery-address rows as exchanged with the backend.

use crate::catalog::ProductId;
use crate::payment::PaymentMethod;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;
pub type OrderId = Uuid;
pub type AddressId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  Placed,
  Confirmed,
  Preparing,
  OutForDelivery,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Placed => "placed",
      OrderStatus::Confirmed => "confirmed",
      OrderStatus::Preparing => "preparing",
      OrderStatus::OutForDelivery => "out_for_delivery",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    Some(match s {
      "placed" | "pending" => OrderStatus::Placed,
      "confirmed" => OrderStatus::Confirmed,
      "preparing" => OrderStatus::Preparing,
      "out_for_delivery" => OrderStatus::OutForDelivery,
      "delivered" => OrderStatus::Delivered,
      "cancelled" => OrderStatus::Cancelled,
      _ => return None,
    })
  }
}

/// Delivery details as typed on the cart screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressInput {
  /// Label such as "Home" or "Office".
  pub name: String,
  pub receiver_name: String,
  pub phone: String,
  /// Address line 1.
  pub house: String,
  /// Address line 2 / landmark.
  pub street: String,
  pub city: String,
  pub state: String,
  pub pincode: String,
  pub is_default: bool,
}

impl AddressInput {
  /// Copies a saved address back into form fields.
  pub fn from_saved(saved: &DeliveryAddress) -> Self {
    Self {
      name: saved.name.clone(),
      receiver_name: saved.receiver_name.clone(),
      phone: saved.phone.clone(),
      house: saved.address_line1.clone(),
      street: saved.address_line2.clone().unwrap_or_default(),
      city: saved.city.clone(),
      state: saved.state.clone(),
      pincode: saved.pincode.clone(),
      is_default: saved.is_default,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDeliveryAddress {
  pub user_id: UserId,
  pub name: String,
  pub receiver_name: String,
  pub phone: String,
  pub address_line1: String,
  pub address_line2: Option<String>,
  pub city: String,
  pub state: String,
  pub pincode: String,
  pub is_default: bool,
}

impl NewDeliveryAddress {
  /// Label defaults to "Home"; receiver falls back to the label.
  pub fn from_input(user_id: UserId, input: &AddressInput) -> Self {
    let name = non_blank(&input.name).unwrap_or_else(|| "Home".to_string());
    let receiver_name = non_blank(&input.receiver_name)
      .or_else(|| non_blank(&input.name))
      .unwrap_or_default();
    Self {
      user_id,
      name,
      receiver_name,
      phone: input.phone.trim().to_string(),
      address_line1: input.house.trim().to_string(),
      address_line2: non_blank(&input.street),
      city: input.city.trim().to_string(),
      state: input.state.trim().to_string(),
      pincode: input.pincode.trim().to_string(),
      is_default: input.is_default,
    }
  }
}

fn non_blank(s: &str) -> Option<String> {
  let trimmed = s.trim();
  (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAddress {
  pub id: AddressId,
  pub user_id: UserId,
  pub name: String,
  pub receiver_name: String,
  pub phone: String,
  pub address_line1: String,
  pub address_line2: Option<String>,
  pub city: String,
  pub state: String,
  pub pincode: String,
  pub is_default: bool,
}

/// Optional checkout details stored alongside an order when the schema has
/// a `metadata` column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderMetadata {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub address: Option<AddressInput>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub payment_method: Option<PaymentMethod>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub payment_reference: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub credits_used: Option<u32>,
}

impl OrderMetadata {
  pub fn is_empty(&self) -> bool {
    self.address.is_none() && self.payment_method.is_none() && self.payment_reference.is_none() && self.credits_used.is_none()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
  pub user_id: UserId,
  /// Amount actually charged: the cart subtotal minus the value of redeemed
  /// credits, not the pre-discount subtotal. Redeemed credits are recorded in
  /// `metadata.credits_used` when the schema has that column.
  pub total_amount: f64,
  pub status: OrderStatus,
  pub delivery_address_id: Option<AddressId>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub metadata: Option<OrderMetadata>,
}

impl NewOrder {
  /// The same order without metadata, for schemas lacking that column.
  pub fn without_metadata(&self) -> Self {
    Self {
      metadata: None,
      ..self.clone()
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
  pub id: OrderId,
  pub user_id: UserId,
  pub total_amount: f64,
  pub status: OrderStatus,
  pub delivery_address_id: Option<AddressId>,
  pub metadata: Option<OrderMetadata>,
  pub created_at: DateTime<Utc>,
}

/// One purchased line. `price` is the unit price copied at purchase time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrderItem {
  pub order_id: OrderId,
  pub product_id: ProductId,
  pub quantity: u32,
  pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: OrderId,
  pub product_id: ProductId,
  pub quantity: u32,
  pub price: f64,
}

/// An order with its lines resolved for the order-history screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSummary {
  pub order: Order,
  pub lines: Vec<OrderLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderLine {
  pub name: String,
  pub quantity: u32,
  pub price: f64,
}
