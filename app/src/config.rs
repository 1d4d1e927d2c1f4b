// grocer/app/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use grocer::SimulatedGateway;
use std::env;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AppConfig {
  /// Postgres connection string. The in-memory backend is used when unset.
  pub database_url: Option<String>,

  /// Latency of the simulated payment gateway.
  pub payment_delay: Duration,

  /// The user the demo session signs in as. A fresh id when unset.
  pub demo_user_id: Option<Uuid>,

  /// Load the sample catalog on startup (only into an empty products table).
  pub seed_catalog: bool,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| env::var(var_name).ok().filter(|v| !v.trim().is_empty());

    let database_url = get_env("DATABASE_URL");

    let payment_delay = match get_env("PAYMENT_DELAY_MS") {
      Some(raw) => Duration::from_millis(
        raw
          .parse::<u64>()
          .map_err(|e| AppError::Config(format!("Invalid PAYMENT_DELAY_MS: {}", e)))?,
      ),
      None => SimulatedGateway::DEFAULT_DELAY,
    };

    let demo_user_id = get_env("DEMO_USER_ID")
      .map(|raw| Uuid::parse_str(&raw))
      .transpose()
      .map_err(|e| AppError::Config(format!("Invalid DEMO_USER_ID: {}", e)))?;

    let seed_catalog = get_env("SEED_CATALOG")
      .unwrap_or_else(|| "true".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid SEED_CATALOG value: {}", e)))?;

    tracing::info!(
      postgres = database_url.is_some(),
      payment_delay_ms = payment_delay.as_millis() as u64,
      seed_catalog,
      "Application configuration loaded successfully."
    );

    Ok(Self {
      database_url,
      payment_delay,
      demo_user_id,
      seed_catalog,
    })
  }
}
