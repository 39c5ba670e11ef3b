//! Port for per-user token accounting and the activation log.
//!
//! Every method is one store transaction. Adapters must make the debit and the
//! pending action insert a single atomic unit and must never let concurrent
//! debits push a balance below zero.
use async_trait::async_trait;

use crate::domain::{ActionId, TriggerId, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by token ledger adapters.
    pub enum TokenLedgerError {
        /// A public user tried to spend a token with a zero balance.
        InsufficientTokens => "no tokens remaining",
        /// The user row does not exist.
        UserNotFound { user_id: String } => "user {user_id} not found",
        /// The store could not be reached.
        Connection { message: String } => "token ledger connection failed: {message}",
        /// A statement failed; the enclosing transaction was rolled back.
        Storage { message: String } => "token ledger storage failed: {message}",
    }
}

/// Result of a successful debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebitReceipt {
    /// Pending action logged alongside the debit.
    pub action_id: ActionId,
    /// Whether a token was actually taken. Admins are never charged.
    pub charged: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// Take one token from a public user (admins pass untouched) and log a
    /// pending action for `trigger_id`, atomically.
    async fn debit_and_record_pending(
        &self,
        user_id: &UserId,
        trigger_id: &TriggerId,
    ) -> Result<DebitReceipt, TokenLedgerError>;

    /// Give one token back. Not idempotent.
    async fn credit_one(&self, user_id: &UserId) -> Result<(), TokenLedgerError>;

    /// Flag a logged action as having reached its device.
    async fn mark_action_success(&self, action_id: ActionId) -> Result<(), TokenLedgerError>;

    /// Reset the balance to `allotment` and append a recharge record.
    async fn recharge(&self, user_id: &UserId, allotment: u32) -> Result<User, TokenLedgerError>;
}
