//! Caller status and recharge.
//!
//! ```text
//! GET /api/user/status
//! POST /api/recharge
//! ```

use actix_web::{get, post, web};
use serde::Serialize;
use tracing::info;

use super::ApiResult;
use super::identity::{INVALID_SESSION_MESSAGE, current_user};
use super::session::VisitorSession;
use super::state::HttpState;
use crate::domain::ports::TokenLedgerError;
use crate::domain::{Error, User};

/// Public view of a user; `{id, tokens_remaining, is_admin}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStatus {
    pub id: String,
    pub tokens_remaining: u32,
    pub is_admin: bool,
}

impl From<&User> for UserStatus {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            tokens_remaining: user.tokens_remaining,
            is_admin: user.is_admin,
        }
    }
}

fn map_ledger_error(error: TokenLedgerError) -> Error {
    match error {
        TokenLedgerError::UserNotFound { .. } => Error::unauthorized(INVALID_SESSION_MESSAGE),
        TokenLedgerError::Connection { message } => Error::service_unavailable(message),
        TokenLedgerError::InsufficientTokens => Error::forbidden("You are out of tokens!"),
        TokenLedgerError::Storage { message } => Error::internal(message),
    }
}

#[get("/user/status")]
pub async fn user_status(
    state: web::Data<HttpState>,
    session: VisitorSession,
) -> ApiResult<web::Json<UserStatus>> {
    let user = current_user(&session, &state).await?;
    Ok(web::Json(UserStatus::from(&user)))
}

#[post("/recharge")]
pub async fn recharge(
    state: web::Data<HttpState>,
    session: VisitorSession,
) -> ApiResult<web::Json<UserStatus>> {
    let user = current_user(&session, &state).await?;
    let user = state
        .ledger
        .recharge(&user.id, state.default_tokens)
        .await
        .map_err(map_ledger_error)?;
    info!(user_id = %user.id, tokens = user.tokens_remaining, "tokens recharged");
    Ok(web::Json(UserStatus::from(&user)))
}
