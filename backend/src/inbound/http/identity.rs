//! Resolve the session cookie to a stored user.
//!
//! A session without a user id gets a fresh public user. A session naming a
//! user the store does not know is cleared and rejected so the browser starts
//! over on its next request.

use tracing::{info, warn};

use super::session::{SessionIdentity, VisitorSession};
use super::state::HttpState;
use crate::domain::ports::UserStoreError;
use crate::domain::{Error, User};

pub(crate) const INVALID_SESSION_MESSAGE: &str = "invalid session, please refresh";

pub(crate) fn map_user_store_error(error: UserStoreError) -> Error {
    match error {
        UserStoreError::Connection { message } => Error::service_unavailable(message),
        UserStoreError::Storage { message } => Error::internal(message),
    }
}

/// Create a user and bind the session to it.
pub(crate) async fn start_session(
    session: &VisitorSession,
    state: &HttpState,
    is_admin: bool,
) -> Result<User, Error> {
    let user = state
        .users
        .create(is_admin, state.default_tokens)
        .await
        .map_err(map_user_store_error)?;
    session.bind(&user.id)?;
    info!(user_id = %user.id, is_admin, "new session started");
    Ok(user)
}

/// Current user for this request, creating a public one when needed.
///
/// # Errors
///
/// `401` for unknown or malformed session ids; store failures map to `503`
/// or `500`.
pub async fn current_user(session: &VisitorSession, state: &HttpState) -> Result<User, Error> {
    match session.identity()? {
        SessionIdentity::Anonymous => start_session(session, state, false).await,
        SessionIdentity::Known(id) => match state
            .users
            .find_by_id(&id)
            .await
            .map_err(map_user_store_error)?
        {
            Some(user) => Ok(user),
            None => {
                warn!(user_id = %id, "session refers to unknown user");
                session.forget();
                Err(Error::unauthorized(INVALID_SESSION_MESSAGE))
            }
        },
        SessionIdentity::Invalid => {
            session.forget();
            Err(Error::unauthorized(INVALID_SESSION_MESSAGE))
        }
    }
}
