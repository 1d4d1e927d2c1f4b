// grocer/src/credits.rs

//! Loyalty credits: balance, transaction log, earn and redeem rules.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

/// 10 credits are worth one currency unit of discount.
pub const CREDITS_TO_DOLLAR: u32 = 10;
/// Share of the paid order total returned as credits.
pub const EARN_RATE: f64 = 0.05;
/// At most this share of the cart value may be paid with credits.
pub const MAX_REDEEM_FRACTION: f64 = 0.5;
/// Onboarding grant every new session starts with.
pub const WELCOME_BONUS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
  Earned,
  Redeemed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditTransaction {
  pub id: String,
  pub kind: TransactionKind,
  pub amount: u32,
  pub description: String,
  pub date: DateTime<Utc>,
}

/// Credits converted to currency.
pub fn credits_value(credits: u32) -> f64 {
  f64::from(credits) / f64::from(CREDITS_TO_DOLLAR)
}

/// Credits a paid total of `order_total` is worth. Non-positive and
/// non-finite totals earn nothing.
pub fn credits_for(order_total: f64) -> u32 {
  if !order_total.is_finite() || order_total <= 0.0 {
    return 0;
  }
  // Float-to-int casts saturate, so an absurd total cannot wrap.
  (order_total * f64::from(CREDITS_TO_DOLLAR) * EARN_RATE).floor() as u32
}

/// Session-scoped credit balance plus its transaction history, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct CreditsLedger {
  balance: u32,
  transactions: Vec<CreditTransaction>,
}

impl Default for CreditsLedger {
  fn default() -> Self {
    Self::new()
  }
}

impl CreditsLedger {
  /// A fresh ledger holding the welcome bonus.
  pub fn new() -> Self {
    Self {
      balance: WELCOME_BONUS,
      transactions: vec![CreditTransaction {
        id: "welcome".to_string(),
        kind: TransactionKind::Earned,
        amount: WELCOME_BONUS,
        description: "Welcome bonus".to_string(),
        date: Utc::now(),
      }],
    }
  }

  /// A ledger with no bonus and no history.
  pub fn empty() -> Self {
    Self {
      balance: 0,
      transactions: Vec::new(),
    }
  }

  pub fn balance(&self) -> u32 {
    self.balance
  }

  pub fn transactions(&self) -> &[CreditTransaction] {
    &self.transactions
  }

  pub fn lifetime_earned(&self) -> u32 {
    self.sum_of(TransactionKind::Earned)
  }

  pub fn lifetime_redeemed(&self) -> u32 {
    self.sum_of(TransactionKind::Redeemed)
  }

  fn sum_of(&self, kind: TransactionKind) -> u32 {
    self
      .transactions
      .iter()
      .filter(|t| t.kind == kind)
      .map(|t| t.amount)
      .sum()
  }

  fn record(&mut self, id: String, kind: TransactionKind, amount: u32, description: String) {
    self.transactions.insert(
      0,
      CreditTransaction {
        id,
        kind,
        amount,
        description,
        date: Utc::now(),
      },
    );
  }

  /// Awards credits for a paid order. Returns the amount awarded (0 means
  /// nothing was recorded).
  pub fn earn_credits(&mut self, order_total: f64, order_id: &str) -> u32 {
    let earned = credits_for(order_total);
    if earned == 0 {
      debug!(order_total, order_id, "Order total earns no credits.");
      return 0;
    }
    self.balance = self.balance.saturating_add(earned);
    self.record(
      format!("earn-{order_id}"),
      TransactionKind::Earned,
      earned,
      format!("Order {order_id}"),
    );
    info!(order_id, earned, balance = self.balance, "Credits earned.");
    earned
  }

  /// Spends `amount` credits. Fails without touching state unless
  /// `0 < amount <= balance`.
  pub fn redeem_credits(&mut self, amount: u32) -> bool {
    if amount == 0 || amount > self.balance {
      debug!(amount, balance = self.balance, "Credit redemption refused.");
      return false;
    }
    self.balance -= amount;
    self.record(
      format!("redeem-{}", Utc::now().timestamp_millis()),
      TransactionKind::Redeemed,
      amount,
      "Checkout discount".to_string(),
    );
    info!(amount, balance = self.balance, "Credits redeemed.");
    true
  }

  /// Gives back credits redeemed for a checkout that did not complete.
  pub fn refund_redemption(&mut self, amount: u32, reason: &str) {
    if amount == 0 {
      return;
    }
    self.balance = self.balance.saturating_add(amount);
    self.record(
      format!("refund-{}", Utc::now().timestamp_millis()),
      TransactionKind::Earned,
      amount,
      format!("Refund: {reason}"),
    );
    info!(amount, balance = self.balance, reason, "Redeemed credits refunded.");
  }

  /// Largest redemption allowed against `cart_total`: the balance, capped at
  /// half the cart value expressed in credits.
  pub fn max_redeemable(&self, cart_total: f64) -> u32 {
    let cap = (cart_total.max(0.0) * MAX_REDEEM_FRACTION * f64::from(CREDITS_TO_DOLLAR)).floor() as u32;
    self.balance.min(cap)
  }
}
