// grocer/src/error.rs
use thiserror::Error;

/// Failures raised by the step-flow engine itself.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("Handler missing for required step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Internal flow error: {0}")]
  Internal(String),
}

/// Failures reported by a [`Backend`](crate::backend::Backend).
///
/// `UnknownColumn` is kept apart from every other rejection so callers can
/// fall back to a narrower payload instead of parsing messages.
#[derive(Debug, Error)]
pub enum BackendError {
  #[error("Table '{table}' has no column '{column}'")]
  UnknownColumn { table: String, column: String },

  #[error("Insert into '{table}' rejected: {message}")]
  Rejected { table: String, message: String },

  #[error("Row not found in '{table}': {id}")]
  NotFound { table: String, id: String },

  #[error("Backend unavailable: {source}")]
  Unavailable {
    #[source]
    source: anyhow::Error,
  },
}

impl BackendError {
  pub fn rejected(table: &str, message: impl Into<String>) -> Self {
    BackendError::Rejected {
      table: table.to_string(),
      message: message.into(),
    }
  }
}

impl From<anyhow::Error> for BackendError {
  fn from(source: anyhow::Error) -> Self {
    BackendError::Unavailable { source }
  }
}

/// Why a checkout attempt failed. The `Display` text is what the shopper sees.
#[derive(Debug, Error)]
pub enum CheckoutError {
  #[error("{0}")]
  Validation(String),

  #[error("User not authenticated")]
  Unauthenticated,

  #[error("Failed to apply credits: requested {requested}, available {available}")]
  Credits { requested: u32, available: u32 },

  #[error("Payment failed: {0}")]
  Payment(String),

  #[error("Address save failed: {0}")]
  AddressSave(#[source] BackendError),

  #[error("Failed to create order: {0}")]
  OrderInsert(#[source] BackendError),

  #[error("Failed to save order items: {0}")]
  OrderItemsInsert(#[source] BackendError),

  #[error("Failed to roll back order {order_id}: {source}")]
  Rollback {
    order_id: uuid::Uuid,
    #[source]
    source: BackendError,
  },

  #[error("A checkout is already in progress for this session")]
  InProgress,

  #[error("Checkout workflow error: {source}")]
  Flow {
    #[from]
    source: FlowError,
  },
}
