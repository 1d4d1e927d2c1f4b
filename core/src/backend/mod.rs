// grocer/src/backend/mod.rs

//! The persistence collaborator: the hosted tables the storefront reads and
//! writes (`products`, `categories`, `orders`, `order_items`,
//! `delivery_addresses`).

pub mod memory;

use crate::catalog::{Category, Product};
use crate::error::BackendError;
use crate::order::{DeliveryAddress, NewDeliveryAddress, NewOrder, NewOrderItem, Order, OrderId, OrderItem, UserId};
use async_trait::async_trait;

pub use memory::{BackendCall, FailPoint, InMemoryBackend};

pub type BackendResult<T> = Result<T, BackendError>;

#[async_trait]
pub trait Backend: Send + Sync {
  async fn list_products(&self) -> BackendResult<Vec<Product>>;

  async fn list_categories(&self) -> BackendResult<Vec<Category>>;

  async fn insert_delivery_address(&self, address: NewDeliveryAddress) -> BackendResult<DeliveryAddress>;

  /// Saved addresses for `user_id`, default address first.
  async fn list_delivery_addresses(&self, user_id: UserId) -> BackendResult<Vec<DeliveryAddress>>;

  /// Inserts one order row. A payload naming a column the schema lacks must
  /// fail with [`BackendError::UnknownColumn`].
  async fn insert_order(&self, order: NewOrder) -> BackendResult<Order>;

  async fn delete_order(&self, order_id: OrderId) -> BackendResult<()>;

  /// Inserts all rows or none.
  async fn insert_order_items(&self, items: Vec<NewOrderItem>) -> BackendResult<Vec<OrderItem>>;

  /// Orders of `user_id`, newest first.
  async fn list_orders(&self, user_id: UserId) -> BackendResult<Vec<Order>>;

  async fn list_order_items(&self, order_ids: &[OrderId]) -> BackendResult<Vec<OrderItem>>;
}
