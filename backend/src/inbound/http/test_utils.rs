//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;

use super::admin::AdminSecret;
use super::state::HttpState;
use crate::domain::{ActivationService, ExecutorSet, StatsService, TriggerRegistry, TriggerTable};
use crate::domain::ports::TriggerExecutor;
use crate::test_support::{InMemoryDashboardStore, MutableClock};

pub const TEST_ADMIN_SECRET: &str = "let-me-in";

/// Session middleware with a fresh key, cookie named `session`, not `Secure`.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Handler state over the in-memory store with `executor` behind every kind.
pub fn in_memory_state(
    table: TriggerTable,
    executor: Arc<dyn TriggerExecutor>,
) -> (HttpState, Arc<InMemoryDashboardStore>) {
    let clock = Arc::new(MutableClock::new(chrono::Utc::now()));
    let store = Arc::new(InMemoryDashboardStore::with_clock(clock.clone()));
    let registry = Arc::new(TriggerRegistry::new(table));
    let executors = Arc::new(ExecutorSet {
        http_device: Arc::clone(&executor),
        light_status: Arc::clone(&executor),
        light_effect: Arc::clone(&executor),
        light_set_state: executor,
    });
    let state = HttpState {
        triggers: Arc::clone(&registry),
        activation: Arc::new(ActivationService::new(
            Arc::clone(&registry),
            store.clone(),
            executors,
        )),
        ledger: store.clone(),
        users: store.clone(),
        stats: Arc::new(StatsService::new(store.clone(), registry, clock)),
        admin_secret: Arc::new(AdminSecret::new(TEST_ADMIN_SECRET)),
        default_tokens: 2,
    };
    (state, store)
}

/// The `session` cookie set by a response, if any.
pub fn session_cookie(response: &ServiceResponse) -> Option<Cookie<'static>> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(|cookie| cookie.into_owned())
}
