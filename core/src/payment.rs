// grocer/src/payment.rs

//! Payment methods and the payment collaborator. Only a simulated gateway is
//! provided; no real provider is integrated.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
  /// Cash on delivery; never goes through the gateway.
  Cod,
  Card,
  Upi,
}

impl PaymentMethod {
  pub fn as_str(self) -> &'static str {
    match self {
      PaymentMethod::Cod => "cod",
      PaymentMethod::Card => "card",
      PaymentMethod::Upi => "upi",
    }
  }

  pub fn needs_gateway(self) -> bool {
    self != PaymentMethod::Cod
  }
}

impl std::fmt::Display for PaymentMethod {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
  pub success: bool,
  pub reference: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  async fn charge(&self, method: PaymentMethod, amount: f64) -> PaymentReceipt;
}

/// Resolves every charge successfully after a fixed delay.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
  delay: Duration,
}

impl SimulatedGateway {
  pub const DEFAULT_DELAY: Duration = Duration::from_millis(800);

  pub fn new(delay: Duration) -> Self {
    Self { delay }
  }
}

impl Default for SimulatedGateway {
  fn default() -> Self {
    Self::new(Self::DEFAULT_DELAY)
  }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
  #[instrument(name = "SimulatedGateway::charge", skip(self), fields(delay_ms = self.delay.as_millis() as u64))]
  async fn charge(&self, method: PaymentMethod, amount: f64) -> PaymentReceipt {
    tokio::time::sleep(self.delay).await;
    let reference = format!("sim-{}-{}", method, Utc::now().timestamp_millis());
    info!(%reference, "Simulated payment succeeded.");
    PaymentReceipt {
      success: true,
      reference: Some(reference),
    }
  }
}
