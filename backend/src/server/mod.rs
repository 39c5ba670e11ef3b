//! Binds the listener and assembles the actix application for each worker.

mod state_builders;

pub(crate) use state_builders::build_http_state;

use std::net::SocketAddr;

use actix_session::SessionMiddleware;
use actix_session::config::{CookieContentSecurity, PersistentSession};
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::Server;
use actix_web::middleware::from_fn;
use actix_web::{App, HttpServer, web};

use maze_dashboard::inbound::http::configure_api;
use maze_dashboard::inbound::http::health::{HealthState, live, ready};
use maze_dashboard::inbound::http::session_config::SessionSettings;
use maze_dashboard::inbound::http::state::HttpState;
use maze_dashboard::trace_requests;

const SESSION_COOKIE: &str = "session";
const SESSION_TTL_DAYS: i64 = 30;

/// Listener address, cookie settings and handler state for [`create_server`].
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub session: SessionSettings,
    pub http_state: HttpState,
}

/// Visitor sessions live in an encrypted cookie; nothing is stored server side.
fn session_middleware(key: Key, secure: bool) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(SESSION_COOKIE.to_owned())
        .cookie_path("/".to_owned())
        .cookie_secure(secure)
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Lax)
        .cookie_content_security(CookieContentSecurity::Private)
        .session_lifecycle(
            PersistentSession::default().session_ttl(CookieDuration::days(SESSION_TTL_DAYS)),
        )
        .build()
}

/// Bind the listener and mark the process ready.
///
/// Signal handling is left to the caller so it can flip the health state to
/// draining before stopping the server.
///
/// # Errors
/// Returns the bind error when the address is unavailable.
pub fn create_server(health: web::Data<HealthState>, config: ServerConfig) -> std::io::Result<Server> {
    let ServerConfig {
        bind_addr,
        session,
        http_state,
    } = config;
    let SessionSettings { key, cookie_secure } = session;
    let http_state = web::Data::new(http_state);
    let health_data = health.clone();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(health_data.clone())
            .app_data(http_state.clone())
            .wrap(session_middleware(key.clone(), cookie_secure))
            .wrap(from_fn(trace_requests))
            .configure(configure_api)
            .service(ready)
            .service(live)
    })
    .disable_signals()
    .bind(bind_addr)?
    .run();

    health.mark_ready();
    Ok(server)
}
