// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use grocer::backend::InMemoryBackend;
use grocer::{
  AddressInput, Category, Collaborators, CreditsLedger, LocalSession, PaymentGateway, PaymentMethod,
  PaymentReceipt, Product, Session, SimulatedGateway,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use uuid::Uuid;

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Catalog fixtures ---

pub fn milk() -> Product {
  Product::new("Whole Milk 1L", 3.99).with_unit("1 L")
}

pub fn bread() -> Product {
  Product::new("White Bread", 2.99).with_unit("400 g")
}

/// List price 6.99, sells at 5.49.
pub fn cheese() -> Product {
  Product::new("Cheddar Cheese", 6.99).with_discount(5.49)
}

pub fn dairy() -> Category {
  Category {
    id: Uuid::new_v4(),
    name: "Dairy".to_string(),
    icon: "🥛".to_string(),
  }
}

pub fn home_address() -> AddressInput {
  AddressInput {
    name: "Home".to_string(),
    receiver_name: "Sam".to_string(),
    phone: "5550100".to_string(),
    house: "123 Main Street, Apt 4B".to_string(),
    street: String::new(),
    city: "Springfield".to_string(),
    state: "IL".to_string(),
    pincode: "62701".to_string(),
    is_default: true,
  }
}

// --- Payment doubles ---

/// Declines every charge and counts attempts.
#[derive(Debug, Default)]
pub struct DecliningGateway {
  pub attempts: AtomicUsize,
}

#[async_trait]
impl PaymentGateway for DecliningGateway {
  async fn charge(&self, _method: PaymentMethod, _amount: f64) -> PaymentReceipt {
    self.attempts.fetch_add(1, Ordering::SeqCst);
    PaymentReceipt {
      success: false,
      reference: None,
    }
  }
}

pub fn instant_gateway() -> Arc<SimulatedGateway> {
  Arc::new(SimulatedGateway::new(Duration::ZERO))
}

// --- Session harness ---

pub struct Harness {
  pub session: Session,
  pub backend: Arc<InMemoryBackend>,
  pub auth: Arc<LocalSession>,
  pub user_id: Uuid,
}

pub fn harness_with(backend: InMemoryBackend, gateway: Arc<dyn PaymentGateway>, ledger: CreditsLedger) -> Harness {
  let user_id = Uuid::new_v4();
  let backend = Arc::new(backend);
  let auth = Arc::new(LocalSession::signed_in(user_id));
  let session = Session::with_ledger(
    Collaborators {
      backend: backend.clone(),
      gateway,
      auth: auth.clone(),
    },
    ledger,
  );
  Harness {
    session,
    backend,
    auth,
    user_id,
  }
}

pub fn harness() -> Harness {
  harness_with(InMemoryBackend::new(), instant_gateway(), CreditsLedger::new())
}

/// Two milks and one bread: 10.97 total, 3 items.
pub fn fill_basic_cart(session: &Session) {
  let milk = milk();
  session.add_to_cart(milk.clone());
  session.add_to_cart(milk);
  session.add_to_cart(bread());
}

pub fn approx_eq(a: f64, b: f64) -> bool {
  (a - b).abs() < 1e-9
}
