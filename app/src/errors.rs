// grocer/app/src/errors.rs

use grocer::{BackendError, CheckoutError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Backend Error: {0}")]
  Backend(#[from] BackendError),

  #[error("Checkout Error: {source}")]
  Checkout {
    #[from]
    source: CheckoutError,
  },

  #[error("Internal Error: {0}")]
  Internal(String),
}

// Lets `?` be used on anyhow results in the binary.
impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(err) => match err.downcast::<BackendError>() {
        Ok(backend_err) => AppError::Backend(backend_err),
        Err(err) => AppError::Internal(err.to_string()),
      },
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn anyhow_wrapping_a_backend_error_is_unwrapped() {
    let wrapped = anyhow::Error::new(BackendError::rejected("orders", "nope"));
    assert!(matches!(AppError::from(wrapped), AppError::Backend(BackendError::Rejected { .. })));
  }

  #[test]
  fn other_anyhow_errors_become_internal() {
    let err = AppError::from(anyhow::anyhow!("disk on fire"));
    assert_eq!(err.to_string(), "Internal Error: disk on fire");
  }

  #[test]
  fn checkout_errors_keep_their_message() {
    let err = AppError::from(CheckoutError::Unauthenticated);
    assert_eq!(err.to_string(), "Checkout Error: User not authenticated");
  }
}
