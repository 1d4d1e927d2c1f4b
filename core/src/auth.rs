// grocer/src/auth.rs

use crate::order::UserId;
use async_trait::async_trait;
use parking_lot::RwLock;

/// Supplies the signed-in user. `None` means not authenticated.
#[async_trait]
pub trait Authenticator: Send + Sync {
  async fn current_user(&self) -> Option<UserId>;
}

/// A session whose user is set and cleared locally, e.g. after a sign-in
/// call made elsewhere.
#[derive(Debug, Default)]
pub struct LocalSession {
  user: RwLock<Option<UserId>>,
}

impl LocalSession {
  pub fn signed_in(user_id: UserId) -> Self {
    Self {
      user: RwLock::new(Some(user_id)),
    }
  }

  pub fn signed_out() -> Self {
    Self::default()
  }

  pub fn sign_in(&self, user_id: UserId) {
    *self.user.write() = Some(user_id);
  }

  pub fn sign_out(&self) {
    *self.user.write() = None;
  }
}

#[async_trait]
impl Authenticator for LocalSession {
  async fn current_user(&self) -> Option<UserId> {
    *self.user.read()
  }
}
