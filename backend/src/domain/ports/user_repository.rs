//! Port for visitor and admin accounts.
//!
//! Accounts are created lazily by the session extractor; there is no lookup
//! by anything other than the id stored in the cookie.
use async_trait::async_trait;

use crate::domain::{User, UserId};

use super::define_port_error;

define_port_error! {
    pub enum UserStoreError {
        Connection { message: String } => "user store unreachable: {message}",
        /// A statement failed or a stored row could not be decoded.
        Storage { message: String } => "user store failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert an account with a fresh random id and `tokens` to spend.
    async fn create(&self, is_admin: bool, tokens: u32) -> Result<User, UserStoreError>;

    /// `Ok(None)` when the cookie names an account that no longer exists.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserStoreError>;
}
