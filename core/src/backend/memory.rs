// grocer/src/backend/memory.rs

//! A process-local backend. Used by the demo binary when no database is
//! configured and by the test suite, which relies on its failure points and
//! call log.

use super::{Backend, BackendResult};
use crate::catalog::{Category, Product};
use crate::error::BackendError;
use crate::order::{DeliveryAddress, NewDeliveryAddress, NewOrder, NewOrderItem, Order, OrderId, OrderItem, UserId};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

/// Operations that can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
  InsertDeliveryAddress,
  InsertOrder,
  InsertOrderItems,
  DeleteOrder,
}

/// A mutating call as seen by the backend, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
  InsertDeliveryAddress,
  InsertOrder { with_metadata: bool },
  InsertOrderItems { order_id: Option<OrderId>, count: usize },
  DeleteOrder(OrderId),
}

#[derive(Debug, Default)]
struct Tables {
  products: Vec<Product>,
  categories: Vec<Category>,
  addresses: Vec<DeliveryAddress>,
  orders: Vec<Order>,
  order_items: Vec<OrderItem>,
  calls: Vec<BackendCall>,
  failing: HashSet<FailPoint>,
  missing_order_columns: HashSet<String>,
}

#[derive(Debug)]
pub struct InMemoryBackend {
  tables: Mutex<Tables>,
}

impl Default for InMemoryBackend {
  fn default() -> Self {
    Self::new()
  }
}

impl InMemoryBackend {
  pub fn new() -> Self {
    Self {
      tables: Mutex::new(Tables::default()),
    }
  }

  /// A backend whose `orders` table has no `metadata` column.
  pub fn without_order_metadata() -> Self {
    let backend = Self::new();
    backend.drop_order_column("metadata");
    backend
  }

  /// Makes order inserts fail with `UnknownColumn` for `column`. A missing
  /// `metadata` column only rejects orders that carry metadata.
  pub fn drop_order_column(&self, column: &str) {
    self.tables.lock().missing_order_columns.insert(column.to_string());
  }

  pub fn restore_order_column(&self, column: &str) {
    self.tables.lock().missing_order_columns.remove(column);
  }

  pub fn with_catalog(self, products: Vec<Product>, categories: Vec<Category>) -> Self {
    {
      let mut tables = self.tables.lock();
      tables.products = products;
      tables.categories = categories;
    }
    self
  }

  /// Makes every later call of `point` fail until [`Self::heal`] is called.
  pub fn fail(&self, point: FailPoint) {
    self.tables.lock().failing.insert(point);
  }

  pub fn heal(&self, point: FailPoint) {
    self.tables.lock().failing.remove(&point);
  }

  pub fn calls(&self) -> Vec<BackendCall> {
    self.tables.lock().calls.clone()
  }

  pub fn orders(&self) -> Vec<Order> {
    self.tables.lock().orders.clone()
  }

  pub fn order_items(&self) -> Vec<OrderItem> {
    self.tables.lock().order_items.clone()
  }

  pub fn addresses(&self) -> Vec<DeliveryAddress> {
    self.tables.lock().addresses.clone()
  }

  fn injected(tables: &Tables, point: FailPoint, table: &str) -> BackendResult<()> {
    if tables.failing.contains(&point) {
      debug!(?point, "Injected backend failure.");
      return Err(BackendError::rejected(table, format!("injected failure at {point:?}")));
    }
    Ok(())
  }
}

#[async_trait]
impl Backend for InMemoryBackend {
  async fn list_products(&self) -> BackendResult<Vec<Product>> {
    Ok(self.tables.lock().products.clone())
  }

  async fn list_categories(&self) -> BackendResult<Vec<Category>> {
    Ok(self.tables.lock().categories.clone())
  }

  async fn insert_delivery_address(&self, address: NewDeliveryAddress) -> BackendResult<DeliveryAddress> {
    let mut tables = self.tables.lock();
    tables.calls.push(BackendCall::InsertDeliveryAddress);
    Self::injected(&tables, FailPoint::InsertDeliveryAddress, "delivery_addresses")?;

    let row = DeliveryAddress {
      id: Uuid::new_v4(),
      user_id: address.user_id,
      name: address.name,
      receiver_name: address.receiver_name,
      phone: address.phone,
      address_line1: address.address_line1,
      address_line2: address.address_line2,
      city: address.city,
      state: address.state,
      pincode: address.pincode,
      is_default: address.is_default,
    };
    tables.addresses.push(row.clone());
    Ok(row)
  }

  async fn list_delivery_addresses(&self, user_id: UserId) -> BackendResult<Vec<DeliveryAddress>> {
    let tables = self.tables.lock();
    let mut found: Vec<DeliveryAddress> = tables.addresses.iter().filter(|a| a.user_id == user_id).cloned().collect();
    // Stable sort keeps insertion order among equals.
    found.sort_by_key(|a| !a.is_default);
    Ok(found)
  }

  async fn insert_order(&self, order: NewOrder) -> BackendResult<Order> {
    let mut tables = self.tables.lock();
    tables.calls.push(BackendCall::InsertOrder {
      with_metadata: order.metadata.is_some(),
    });
    Self::injected(&tables, FailPoint::InsertOrder, "orders")?;

    let rejected = tables
      .missing_order_columns
      .iter()
      .find(|column| column.as_str() != "metadata" || order.metadata.is_some());
    if let Some(column) = rejected {
      return Err(BackendError::UnknownColumn {
        table: "orders".to_string(),
        column: column.clone(),
      });
    }

    let row = Order {
      id: Uuid::new_v4(),
      user_id: order.user_id,
      total_amount: order.total_amount,
      status: order.status,
      delivery_address_id: order.delivery_address_id,
      metadata: order.metadata,
      created_at: Utc::now(),
    };
    tables.orders.push(row.clone());
    Ok(row)
  }

  async fn delete_order(&self, order_id: OrderId) -> BackendResult<()> {
    let mut tables = self.tables.lock();
    tables.calls.push(BackendCall::DeleteOrder(order_id));
    Self::injected(&tables, FailPoint::DeleteOrder, "orders")?;

    let before = tables.orders.len();
    tables.orders.retain(|o| o.id != order_id);
    if tables.orders.len() == before {
      return Err(BackendError::NotFound {
        table: "orders".to_string(),
        id: order_id.to_string(),
      });
    }
    tables.order_items.retain(|item| item.order_id != order_id);
    Ok(())
  }

  async fn insert_order_items(&self, items: Vec<NewOrderItem>) -> BackendResult<Vec<OrderItem>> {
    let mut tables = self.tables.lock();
    tables.calls.push(BackendCall::InsertOrderItems {
      order_id: items.first().map(|i| i.order_id),
      count: items.len(),
    });
    Self::injected(&tables, FailPoint::InsertOrderItems, "order_items")?;

    if let Some(orphan) = items.iter().find(|i| !tables.orders.iter().any(|o| o.id == i.order_id)) {
      return Err(BackendError::rejected(
        "order_items",
        format!("order {} does not exist", orphan.order_id),
      ));
    }

    let rows: Vec<OrderItem> = items
      .into_iter()
      .map(|item| OrderItem {
        id: Uuid::new_v4(),
        order_id: item.order_id,
        product_id: item.product_id,
        quantity: item.quantity,
        price: item.price,
      })
      .collect();
    tables.order_items.extend(rows.iter().cloned());
    Ok(rows)
  }

  async fn list_orders(&self, user_id: UserId) -> BackendResult<Vec<Order>> {
    let tables = self.tables.lock();
    // Reversed first so orders sharing a timestamp still come out newest first.
    let mut found: Vec<Order> = tables.orders.iter().rev().filter(|o| o.user_id == user_id).cloned().collect();
    found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(found)
  }

  async fn list_order_items(&self, order_ids: &[OrderId]) -> BackendResult<Vec<OrderItem>> {
    let tables = self.tables.lock();
    Ok(
      tables
        .order_items
        .iter()
        .filter(|item| order_ids.contains(&item.order_id))
        .cloned()
        .collect(),
    )
  }
}
