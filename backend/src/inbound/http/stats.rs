//! `GET /api/stats`: admin-only dashboard statistics.

use actix_web::{get, web};

use super::ApiResult;
use super::identity::current_user;
use super::session::VisitorSession;
use super::state::HttpState;
use crate::domain::{DashboardStats, Error};

#[get("/stats")]
pub async fn dashboard_stats(
    state: web::Data<HttpState>,
    session: VisitorSession,
) -> ApiResult<web::Json<DashboardStats>> {
    let user = current_user(&session, &state).await?;
    if !user.is_admin {
        return Err(Error::forbidden("Forbidden: Admins only"));
    }
    let stats = state.stats.dashboard_stats().await.map_err(Error::from)?;
    Ok(web::Json(stats))
}
