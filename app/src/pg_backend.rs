// grocer/app/src/pg_backend.rs

//! Postgres implementation of the checkout backend, using runtime `sqlx`
//! queries against the tables in `schema.sql`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grocer::backend::{Backend, BackendResult};
use grocer::order::{AddressId, NewDeliveryAddress, NewOrder, NewOrderItem};
use grocer::{BackendError, Category, DeliveryAddress, Order, OrderId, OrderItem, OrderStatus, Product, UserId};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::{error, instrument, warn};
use uuid::Uuid;

/// Postgres SQLSTATE for `undefined_column`.
const UNDEFINED_COLUMN: &str = "42703";

#[derive(Debug, Clone)]
pub struct PgBackend {
  pool: PgPool,
}

impl PgBackend {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  /// Loads the sample catalog when the products table is empty.
  #[instrument(name = "PgBackend::seed_catalog", skip_all, fields(products = products.len()))]
  pub async fn seed_catalog(&self, categories: &[Category], products: &[Product]) -> BackendResult<bool> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
      .fetch_one(&self.pool)
      .await
      .map_err(|e| backend_error("products", e))?;
    if existing > 0 {
      return Ok(false);
    }

    let mut tx = self.pool.begin().await.map_err(|e| backend_error("categories", e))?;
    for category in categories {
      sqlx::query("INSERT INTO categories (id, name, icon) VALUES ($1, $2, $3)")
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.icon)
        .execute(&mut *tx)
        .await
        .map_err(|e| backend_error("categories", e))?;
    }
    for product in products {
      sqlx::query(
        "INSERT INTO products (id, category_id, name, price, discount_price, unit, is_active, description, stock) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
      )
      .bind(product.id)
      .bind(product.category_id)
      .bind(&product.name)
      .bind(product.price)
      .bind(product.discount_price)
      .bind(&product.unit)
      .bind(product.is_active)
      .bind(&product.description)
      .bind(product.stock)
      .execute(&mut *tx)
      .await
      .map_err(|e| backend_error("products", e))?;
    }
    tx.commit().await.map_err(|e| backend_error("products", e))?;
    Ok(true)
  }
}

/// Maps a driver error onto the backend error kinds the checkout reacts to.
fn backend_error(table: &str, err: sqlx::Error) -> BackendError {
  match err {
    sqlx::Error::Database(db) => {
      if db.code().as_deref() == Some(UNDEFINED_COLUMN) {
        BackendError::UnknownColumn {
          table: table.to_string(),
          column: quoted_identifier(db.message()).unwrap_or("unknown").to_string(),
        }
      } else {
        BackendError::rejected(table, db.message())
      }
    }
    sqlx::Error::RowNotFound => BackendError::NotFound {
      table: table.to_string(),
      id: String::new(),
    },
    other => {
      error!(%table, error = %other, "Database unavailable.");
      BackendError::from(anyhow::Error::new(other))
    }
  }
}

/// First double-quoted identifier in a server message, e.g. `metadata` in
/// `column "metadata" of relation "orders" does not exist`.
fn quoted_identifier(message: &str) -> Option<&str> {
  let start = message.find('"')? + 1;
  let len = message[start..].find('"')?;
  Some(&message[start..start + len])
}

fn to_quantity(raw: i32) -> u32 {
  u32::try_from(raw).unwrap_or_default()
}

fn to_db_quantity(quantity: u32) -> Result<i32, BackendError> {
  i32::try_from(quantity).map_err(|_| BackendError::rejected("order_items", format!("quantity {quantity} out of range")))
}

// --- Row types ---

#[derive(Debug, FromRow)]
struct ProductRow {
  id: Uuid,
  category_id: Option<Uuid>,
  name: String,
  price: f64,
  discount_price: Option<f64>,
  unit: Option<String>,
  image_url: Option<String>,
  is_active: bool,
  created_at: Option<DateTime<Utc>>,
  stock: Option<i32>,
  description: Option<String>,
}

impl From<ProductRow> for Product {
  fn from(row: ProductRow) -> Self {
    Product {
      id: row.id,
      name: row.name,
      price: row.price,
      discount_price: row.discount_price,
      unit: row.unit,
      category_id: row.category_id,
      is_active: row.is_active,
      description: row.description,
      image_url: row.image_url,
      stock: row.stock,
      created_at: row.created_at,
    }
  }
}

#[derive(Debug, FromRow)]
struct CategoryRow {
  id: Uuid,
  name: String,
  icon: Option<String>,
}

#[derive(Debug, FromRow)]
struct AddressRow {
  id: AddressId,
  user_id: UserId,
  name: String,
  receiver_name: String,
  phone: String,
  address_line1: String,
  address_line2: Option<String>,
  city: String,
  state: String,
  pincode: String,
  is_default: bool,
}

impl From<AddressRow> for DeliveryAddress {
  fn from(row: AddressRow) -> Self {
    DeliveryAddress {
      id: row.id,
      user_id: row.user_id,
      name: row.name,
      receiver_name: row.receiver_name,
      phone: row.phone,
      address_line1: row.address_line1,
      address_line2: row.address_line2,
      city: row.city,
      state: row.state,
      pincode: row.pincode,
      is_default: row.is_default,
    }
  }
}

#[derive(Debug, FromRow)]
struct OrderRow {
  id: OrderId,
  user_id: UserId,
  total_amount: f64,
  status: String,
  delivery_address_id: Option<AddressId>,
  created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
  fn from(row: OrderRow) -> Self {
    let status = OrderStatus::parse(&row.status).unwrap_or_else(|| {
      warn!(order_id = %row.id, status = %row.status, "Unknown order status; treating as placed.");
      OrderStatus::Placed
    });
    Order {
      id: row.id,
      user_id: row.user_id,
      total_amount: row.total_amount,
      status,
      delivery_address_id: row.delivery_address_id,
      // Not selected: the column may not exist.
      metadata: None,
      created_at: row.created_at,
    }
  }
}

#[derive(Debug, FromRow)]
struct OrderItemRow {
  id: Uuid,
  order_id: OrderId,
  product_id: Uuid,
  quantity: i32,
  price: f64,
}

impl From<OrderItemRow> for OrderItem {
  fn from(row: OrderItemRow) -> Self {
    OrderItem {
      id: row.id,
      order_id: row.order_id,
      product_id: row.product_id,
      quantity: to_quantity(row.quantity),
      price: row.price,
    }
  }
}

const ORDER_COLUMNS: &str = "id, user_id, total_amount, status, delivery_address_id, created_at";
const ADDRESS_COLUMNS: &str =
  "id, user_id, name, receiver_name, phone, address_line1, address_line2, city, state, pincode, is_default";

#[async_trait]
impl Backend for PgBackend {
  async fn list_products(&self) -> BackendResult<Vec<Product>> {
    let rows: Vec<ProductRow> = sqlx::query_as(
      "SELECT id, category_id, name, price, discount_price, unit, image_url, is_active, created_at, stock, description \
       FROM products",
    )
    .fetch_all(&self.pool)
    .await
    .map_err(|e| backend_error("products", e))?;
    Ok(rows.into_iter().map(Product::from).collect())
  }

  async fn list_categories(&self) -> BackendResult<Vec<Category>> {
    let rows: Vec<CategoryRow> = sqlx::query_as("SELECT id, name, icon FROM categories ORDER BY name ASC")
      .fetch_all(&self.pool)
      .await
      .map_err(|e| backend_error("categories", e))?;
    Ok(
      rows
        .into_iter()
        .map(|row| Category {
          id: row.id,
          name: row.name,
          icon: row.icon.unwrap_or_default(),
        })
        .collect(),
    )
  }

  #[instrument(name = "PgBackend::insert_delivery_address", skip_all, fields(user_id = %address.user_id))]
  async fn insert_delivery_address(&self, address: NewDeliveryAddress) -> BackendResult<DeliveryAddress> {
    let row: AddressRow = sqlx::query_as(&format!(
      "INSERT INTO delivery_addresses \
       (user_id, name, receiver_name, phone, address_line1, address_line2, city, state, pincode, is_default) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {ADDRESS_COLUMNS}"
    ))
    .bind(address.user_id)
    .bind(&address.name)
    .bind(&address.receiver_name)
    .bind(&address.phone)
    .bind(&address.address_line1)
    .bind(&address.address_line2)
    .bind(&address.city)
    .bind(&address.state)
    .bind(&address.pincode)
    .bind(address.is_default)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| backend_error("delivery_addresses", e))?;
    Ok(row.into())
  }

  async fn list_delivery_addresses(&self, user_id: UserId) -> BackendResult<Vec<DeliveryAddress>> {
    let rows: Vec<AddressRow> = sqlx::query_as(&format!(
      "SELECT {ADDRESS_COLUMNS} FROM delivery_addresses WHERE user_id = $1 ORDER BY is_default DESC, created_at ASC"
    ))
    .bind(user_id)
    .fetch_all(&self.pool)
    .await
    .map_err(|e| backend_error("delivery_addresses", e))?;
    Ok(rows.into_iter().map(DeliveryAddress::from).collect())
  }

  #[instrument(
    name = "PgBackend::insert_order",
    skip_all,
    fields(user_id = %order.user_id, with_metadata = order.metadata.is_some())
  )]
  async fn insert_order(&self, order: NewOrder) -> BackendResult<Order> {
    let sql = match order.metadata {
      Some(_) => format!(
        "INSERT INTO orders (user_id, total_amount, status, delivery_address_id, metadata) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {ORDER_COLUMNS}"
      ),
      None => format!(
        "INSERT INTO orders (user_id, total_amount, status, delivery_address_id) \
         VALUES ($1, $2, $3, $4) RETURNING {ORDER_COLUMNS}"
      ),
    };
    let mut query = sqlx::query_as::<_, OrderRow>(&sql)
      .bind(order.user_id)
      .bind(order.total_amount)
      .bind(order.status.as_str())
      .bind(order.delivery_address_id);
    if let Some(metadata) = &order.metadata {
      query = query.bind(Json(metadata.clone()));
    }
    let row = query.fetch_one(&self.pool).await.map_err(|e| backend_error("orders", e))?;
    let mut created = Order::from(row);
    created.metadata = order.metadata;
    Ok(created)
  }

  #[instrument(name = "PgBackend::delete_order", skip(self))]
  async fn delete_order(&self, order_id: OrderId) -> BackendResult<()> {
    let mut tx = self.pool.begin().await.map_err(|e| backend_error("orders", e))?;
    sqlx::query("DELETE FROM order_items WHERE order_id = $1")
      .bind(order_id)
      .execute(&mut *tx)
      .await
      .map_err(|e| backend_error("order_items", e))?;
    let deleted = sqlx::query("DELETE FROM orders WHERE id = $1")
      .bind(order_id)
      .execute(&mut *tx)
      .await
      .map_err(|e| backend_error("orders", e))?
      .rows_affected();
    if deleted == 0 {
      return Err(BackendError::NotFound {
        table: "orders".to_string(),
        id: order_id.to_string(),
      });
    }
    tx.commit().await.map_err(|e| backend_error("orders", e))
  }

  #[instrument(name = "PgBackend::insert_order_items", skip_all, fields(count = items.len()))]
  async fn insert_order_items(&self, items: Vec<NewOrderItem>) -> BackendResult<Vec<OrderItem>> {
    let mut tx = self.pool.begin().await.map_err(|e| backend_error("order_items", e))?;
    let mut created = Vec::with_capacity(items.len());
    for item in &items {
      let row: OrderItemRow = sqlx::query_as(
        "INSERT INTO order_items (order_id, product_id, quantity, price) VALUES ($1, $2, $3, $4) \
         RETURNING id, order_id, product_id, quantity, price",
      )
      .bind(item.order_id)
      .bind(item.product_id)
      .bind(to_db_quantity(item.quantity)?)
      .bind(item.price)
      .fetch_one(&mut *tx)
      .await
      .map_err(|e| backend_error("order_items", e))?;
      created.push(OrderItem::from(row));
    }
    tx.commit().await.map_err(|e| backend_error("order_items", e))?;
    Ok(created)
  }

  async fn list_orders(&self, user_id: UserId) -> BackendResult<Vec<Order>> {
    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
      "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(&self.pool)
    .await
    .map_err(|e| backend_error("orders", e))?;
    Ok(rows.into_iter().map(Order::from).collect())
  }

  async fn list_order_items(&self, order_ids: &[OrderId]) -> BackendResult<Vec<OrderItem>> {
    if order_ids.is_empty() {
      return Ok(Vec::new());
    }
    let rows: Vec<OrderItemRow> = sqlx::query_as(
      "SELECT id, order_id, product_id, quantity, price FROM order_items WHERE order_id = ANY($1)",
    )
    .bind(order_ids.to_vec())
    .fetch_all(&self.pool)
    .await
    .map_err(|e| backend_error("order_items", e))?;
    Ok(rows.into_iter().map(OrderItem::from).collect())
  }
}
