//! PostgreSQL-backed token ledger.
//!
//! The debit is a conditional `UPDATE ... WHERE tokens_remaining > 0 AND NOT
//! is_admin`, so concurrent debits serialise on the row lock and can never
//! drive a balance negative. The pending action insert shares its
//! transaction.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{DebitReceipt, TokenLedger, TokenLedgerError};
use crate::domain::{ActionId, TriggerId, User, UserId};

use super::error_mapping::{classify_diesel_error, pool_error_message};
use super::models::{NewActionRow, NewRechargeRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{actions, recharges, users};

/// Diesel implementation of [`TokenLedger`].
#[derive(Clone)]
pub struct DieselTokenLedger {
    pool: DbPool,
}

impl DieselTokenLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Transaction outcome: either a ledger decision or a database failure.
#[derive(Debug)]
enum LedgerTxError {
    Ledger(TokenLedgerError),
    Diesel(diesel::result::Error),
}

impl From<diesel::result::Error> for LedgerTxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn map_pool_error(error: PoolError) -> TokenLedgerError {
    TokenLedgerError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error, operation: &str) -> TokenLedgerError {
    match classify_diesel_error(error, operation) {
        Ok(message) => TokenLedgerError::storage(message),
        Err(message) => TokenLedgerError::connection(message),
    }
}

fn map_tx_error(error: LedgerTxError, operation: &str) -> TokenLedgerError {
    match error {
        LedgerTxError::Ledger(error) => error,
        LedgerTxError::Diesel(error) => map_diesel_error(error, operation),
    }
}

#[async_trait]
impl TokenLedger for DieselTokenLedger {
    async fn debit_and_record_pending(
        &self,
        user_id: &UserId,
        trigger_id: &TriggerId,
    ) -> Result<DebitReceipt, TokenLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let uid = *user_id.as_uuid();
        let trigger = trigger_id.as_str().to_owned();

        conn.transaction(|conn| {
            async move {
                let debited = diesel::update(
                    users::table
                        .filter(users::id.eq(uid))
                        .filter(users::tokens_remaining.gt(0))
                        .filter(users::is_admin.eq(false)),
                )
                .set(users::tokens_remaining.eq(users::tokens_remaining - 1))
                .execute(conn)
                .await?;

                let charged = if debited == 1 {
                    true
                } else {
                    let is_admin: Option<bool> = users::table
                        .find(uid)
                        .select(users::is_admin)
                        .first(conn)
                        .await
                        .optional()?;
                    match is_admin {
                        Some(true) => false,
                        Some(false) => {
                            return Err(LedgerTxError::Ledger(
                                TokenLedgerError::insufficient_tokens(),
                            ));
                        }
                        None => {
                            return Err(LedgerTxError::Ledger(TokenLedgerError::user_not_found(
                                uid.to_string(),
                            )));
                        }
                    }
                };

                let action_id: i64 = diesel::insert_into(actions::table)
                    .values(NewActionRow {
                        user_id: uid,
                        trigger_id: trigger.as_str(),
                    })
                    .returning(actions::id)
                    .get_result(conn)
                    .await?;

                Ok(DebitReceipt {
                    action_id: ActionId::new(action_id),
                    charged,
                })
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| map_tx_error(error, "debit"))
    }

    async fn credit_one(&self, user_id: &UserId) -> Result<(), TokenLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(users::table.find(*user_id.as_uuid()))
            .set(users::tokens_remaining.eq(users::tokens_remaining + 1))
            .execute(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, "credit"))?;
        if updated == 0 {
            return Err(TokenLedgerError::user_not_found(user_id.to_string()));
        }
        debug!(user_id = %user_id, "token credited");
        Ok(())
    }

    async fn mark_action_success(&self, action_id: ActionId) -> Result<(), TokenLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(actions::table.find(action_id.get()))
            .set(actions::success.eq(true))
            .execute(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, "mark action success"))?;
        if updated == 0 {
            return Err(TokenLedgerError::storage(format!(
                "action {action_id} not found"
            )));
        }
        Ok(())
    }

    async fn recharge(&self, user_id: &UserId, allotment: u32) -> Result<User, TokenLedgerError> {
        let allotment = i32::try_from(allotment)
            .map_err(|_| TokenLedgerError::storage(format!("allotment {allotment} too large")))?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let uid = *user_id.as_uuid();

        let row = conn
            .transaction(|conn| {
                async move {
                    let row: Option<UserRow> = diesel::update(users::table.find(uid))
                        .set(users::tokens_remaining.eq(allotment))
                        .returning(UserRow::as_returning())
                        .get_result(conn)
                        .await
                        .optional()?;
                    let Some(row) = row else {
                        return Err(LedgerTxError::Ledger(TokenLedgerError::user_not_found(
                            uid.to_string(),
                        )));
                    };
                    diesel::insert_into(recharges::table)
                        .values(NewRechargeRow { user_id: uid })
                        .execute(conn)
                        .await?;
                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(|error| map_tx_error(error, "recharge"))?;

        Ok(User::from(row))
    }
}
