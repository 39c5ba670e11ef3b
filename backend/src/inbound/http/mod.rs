//! HTTP inbound adapter: the dashboard's JSON API.

pub mod account;
pub mod activation;
pub mod admin;
pub mod error;
pub mod health;
pub mod identity;
pub mod session;
pub mod session_config;
pub mod state;
pub mod stats;
#[cfg(test)]
pub mod test_utils;
pub mod triggers;
pub mod version;

use actix_web::web;

pub use error::ApiResult;

/// Register every `/api` endpoint.
///
/// Callers supply the session middleware and `web::Data<HttpState>`.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(triggers::list_triggers)
            .service(activation::activate)
            .service(account::user_status)
            .service(account::recharge)
            .service(stats::dashboard_stats)
            .service(admin::admin_login)
            .service(admin::admin_logout)
            .service(version::version),
    );
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod api_tests;
