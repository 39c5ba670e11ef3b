//! Admin login and logout.
//!
//! ```text
//! POST /api/admin/login {"admin_key":"..."}
//! POST /api/admin/logout
//! ```
//!
//! Both start a brand new user session; an existing public user is never
//! promoted.

use actix_web::{HttpResponse, post, web};
use serde::Deserialize;
use tracing::warn;
use zeroize::{Zeroize, Zeroizing};

use super::ApiResult;
use super::account::UserStatus;
use super::identity::start_session;
use super::session::VisitorSession;
use super::state::HttpState;
use crate::domain::Error;

/// Shared admin secret, wiped from memory on drop.
pub struct AdminSecret(Zeroizing<String>);

impl AdminSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    /// Compare without short-circuiting on the first differing byte.
    pub fn matches(&self, candidate: &str) -> bool {
        let expected = self.0.as_bytes();
        let candidate = candidate.as_bytes();
        let mut diff = expected.len() ^ candidate.len();
        for (index, byte) in expected.iter().enumerate() {
            let other = candidate.get(index).copied().unwrap_or(0);
            diff |= usize::from(byte ^ other);
        }
        diff == 0
    }
}

impl std::fmt::Debug for AdminSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AdminSecret(..)")
    }
}

#[derive(Deserialize)]
pub struct AdminLoginRequest {
    admin_key: String,
}

impl Drop for AdminLoginRequest {
    fn drop(&mut self) {
        self.admin_key.zeroize();
    }
}

#[post("/admin/login")]
pub async fn admin_login(
    state: web::Data<HttpState>,
    session: VisitorSession,
    payload: web::Json<AdminLoginRequest>,
) -> ApiResult<web::Json<UserStatus>> {
    if !state.admin_secret.matches(&payload.admin_key) {
        warn!("admin login rejected");
        return Err(Error::unauthorized("Invalid secret key"));
    }
    let user = start_session(&session, &state, true).await?;
    Ok(web::Json(UserStatus::from(&user)))
}

#[post("/admin/logout")]
pub async fn admin_logout(
    state: web::Data<HttpState>,
    session: VisitorSession,
) -> ApiResult<HttpResponse> {
    let user = start_session(&session, &state, false).await?;
    Ok(HttpResponse::Ok().json(UserStatus::from(&user)))
}
