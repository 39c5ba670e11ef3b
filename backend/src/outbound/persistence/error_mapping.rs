//! Shared Diesel and pool error mapping for the dashboard repositories.

use tracing::debug;

use crate::domain::User;
use crate::domain::UserId;

use super::models::UserRow;
use super::pool::PoolError;

/// Extract a readable message from a pool error.
pub(super) fn pool_error_message(error: PoolError) -> String {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    }
}

/// Classify a Diesel error as a lost connection or a failed statement, logging
/// the detail at debug level.
///
/// Returns `Ok(message)` for statement failures and `Err(message)` when the
/// connection itself went away.
pub(super) fn classify_diesel_error(
    error: diesel::result::Error,
    operation: &str,
) -> Result<String, String> {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), %operation, "diesel operation failed");
        }
        _ => debug!(error = %error, %operation, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            Err(format!("{operation}: database connection lost"))
        }
        DieselError::NotFound => Ok(format!("{operation}: record not found")),
        _ => Ok(format!("{operation}: database error")),
    }
}

/// Saturating conversion for counts returned as `BIGINT`.
pub(super) fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::from_uuid(row.id),
            tokens_remaining: u32::try_from(row.tokens_remaining).unwrap_or(0),
            is_admin: row.is_admin,
            created_at: row.created_at,
        }
    }
}
