// grocer/app/src/main.rs

mod config;
mod demo;
mod errors;
mod pg_backend;
mod seed;

use crate::config::AppConfig;
use crate::errors::Result as AppResult;
use crate::pg_backend::PgBackend;

use grocer::{Backend, Collaborators, InMemoryBackend, LocalSession, Session, SimulatedGateway};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use uuid::Uuid;

#[tokio::main]
async fn main() -> AppResult<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO) // Default level
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE) // Log when spans close, showing duration
    .init();

  tracing::info!("Starting grocer demo...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => cfg,
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(e);
    }
  };

  let backend = build_backend(&app_config).await?;

  let user_id = app_config.demo_user_id.unwrap_or_else(Uuid::new_v4);
  let session = Session::new(Collaborators {
    backend,
    gateway: Arc::new(SimulatedGateway::new(app_config.payment_delay)),
    auth: Arc::new(LocalSession::signed_in(user_id)),
  });
  tracing::info!(%user_id, credits = session.credits(), "Session started.");

  demo::run(&session).await
}

async fn build_backend(app_config: &AppConfig) -> AppResult<Arc<dyn Backend>> {
  let (categories, products) = if app_config.seed_catalog {
    seed::sample_catalog()
  } else {
    (Vec::new(), Vec::new())
  };

  let Some(database_url) = &app_config.database_url else {
    tracing::info!("DATABASE_URL not set; using the in-memory backend.");
    return Ok(Arc::new(InMemoryBackend::new().with_catalog(products, categories)));
  };

  let pool = match PgPool::connect(database_url).await {
    Ok(pool) => {
      tracing::info!("Successfully connected to the database.");
      pool
    }
    Err(e) => {
      tracing::error!(error = %e, "Failed to connect to the database.");
      return Err(e.into());
    }
  };

  let backend = PgBackend::new(pool);
  if app_config.seed_catalog {
    let seeded = backend.seed_catalog(&categories, &products).await?;
    tracing::info!(seeded, "Catalog seeding checked.");
  }
  Ok(Arc::new(backend))
}
