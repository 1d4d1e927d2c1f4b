// grocer/src/lib.rs

//! grocer: the checkout core of a grocery storefront.
//!
//! It covers:
//!  - A cart aggregate whose totals are always derived from its lines.
//!  - A loyalty-credits ledger (earn 5% of the paid total, 10 credits per
//!    currency unit, redemption capped at half the cart value).
//!  - A checkout orchestrator built on a small step-flow engine, with
//!    compensations for the steps that must be undone on partial failure.
//!  - A [`Session`] that owns the cart and ledger and receives its
//!    collaborators (backend, payment gateway, authenticator) explicitly.

pub mod auth;
pub mod backend;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod credits;
pub mod error;
pub mod flow;
pub mod order;
pub mod payment;
pub mod session;

// --- Re-exports for the Public API ---

pub use crate::auth::{Authenticator, LocalSession};
pub use crate::backend::{Backend, BackendResult, InMemoryBackend};
pub use crate::cart::{Cart, CartItem};
pub use crate::catalog::{Catalog, Category, Product, ProductId};
pub use crate::checkout::{format_amount, CheckoutOutcome, CheckoutQuote, CheckoutReceipt, PlaceOrderOptions};
pub use crate::credits::{CreditTransaction, CreditsLedger, TransactionKind, CREDITS_TO_DOLLAR, EARN_RATE};
pub use crate::error::{BackendError, CheckoutError, FlowError};
pub use crate::flow::{FlowOutcome, Pipeline, Shared, StepControl};
pub use crate::order::{AddressInput, DeliveryAddress, Order, OrderId, OrderItem, OrderStatus, OrderSummary, UserId};
pub use crate::payment::{PaymentGateway, PaymentMethod, PaymentReceipt, SimulatedGateway};
pub use crate::session::{Collaborators, Session};
