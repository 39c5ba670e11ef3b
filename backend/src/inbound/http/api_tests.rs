//! End-to-end handler behaviour over the in-memory store.

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, test, web};
use rstest::rstest;
use serde_json::{Value, json};

use super::configure_api;
use super::session::VisitorSession;
use super::test_utils::{TEST_ADMIN_SECRET, in_memory_state, session_cookie, test_session_middleware};
use crate::domain::{Error, Trigger, TriggerKind, TriggerTable, UserId};
use crate::test_support::{InMemoryDashboardStore, ScriptedExecutor};

fn table() -> TriggerTable {
    TriggerTable::new(vec![
        Trigger::new(
            "scream",
            "Banshee Scream",
            TriggerKind::HttpDevice {
                address: "10.0.0.2".into(),
                secret_key: "do-not-leak".into(),
            },
        )
        .with_description("Hallway speaker"),
    ])
}

/// Build the API app plus a `/test/bind/{id}` route that binds the session to
/// an arbitrary user id.
macro_rules! api_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .wrap(test_session_middleware())
                .configure(configure_api)
                .route(
                    "/test/bind/{id}",
                    web::get().to(|session: VisitorSession, path: web::Path<String>| async move {
                        let id = UserId::new(path.into_inner()).map_err(|_| Error::invalid_request("id"))?;
                        session.bind(&id)?;
                        Ok::<_, Error>(HttpResponse::Ok())
                    }),
                ),
        )
        .await
    };
}

/// Carries the session cookie across requests like a browser.
#[derive(Default)]
struct Browser {
    cookie: Option<Cookie<'static>>,
}

impl Browser {
    fn request(&self, request: test::TestRequest) -> actix_http::Request {
        match &self.cookie {
            Some(cookie) => request.cookie(cookie.clone()).to_request(),
            None => request.to_request(),
        }
    }

    fn absorb(&mut self, response: &ServiceResponse) {
        if let Some(cookie) = session_cookie(response) {
            self.cookie = Some(cookie);
        }
    }
}

async fn json_body(response: ServiceResponse) -> Value {
    let body = test::read_body(response).await;
    serde_json::from_slice(&body).expect("JSON body")
}

fn user_id_of(body: &Value) -> UserId {
    UserId::new(body["id"].as_str().expect("id field")).expect("valid user id")
}

async fn wait_for_success(store: &InMemoryDashboardStore, expected: usize) {
    for _ in 0..100 {
        if store.actions().iter().filter(|a| a.success).count() >= expected {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("dispatch never marked {expected} actions successful");
}

#[rstest]
#[actix_web::test]
async fn first_visit_creates_public_user() {
    let (state, store) = in_memory_state(table(), Arc::new(ScriptedExecutor::succeeding()));
    let app = api_app!(state);
    let mut browser = Browser::default();

    let res = test::call_service(
        &app,
        browser.request(test::TestRequest::get().uri("/api/user/status")),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    browser.absorb(&res);
    let first = json_body(res).await;
    assert_eq!(first["tokens_remaining"], 2);
    assert_eq!(first["is_admin"], false);

    let res = test::call_service(
        &app,
        browser.request(test::TestRequest::get().uri("/api/user/status")),
    )
    .await;
    let second = json_body(res).await;
    assert_eq!(second["id"], first["id"]);
    assert_eq!(store.balance(&user_id_of(&first)), Some(2));
}

#[rstest]
#[actix_web::test]
async fn trigger_listing_hides_secrets() {
    let (state, _store) = in_memory_state(table(), Arc::new(ScriptedExecutor::succeeding()));
    let app = api_app!(state);

    let res = test::call_service(&app, test::TestRequest::get().uri("/api/triggers").to_request()).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(
        body,
        json!([{
            "id": "scream",
            "name": "Banshee Scream",
            "description": "Hallway speaker",
            "type": "http_device"
        }])
    );
}

#[rstest]
#[actix_web::test]
async fn activation_spends_tokens_until_empty() {
    let executor = Arc::new(ScriptedExecutor::succeeding());
    let (state, store) = in_memory_state(table(), executor.clone());
    let app = api_app!(state);
    let mut browser = Browser::default();

    for expected_action in 1..=2 {
        let res = test::call_service(
            &app,
            browser.request(test::TestRequest::post().uri("/api/activate/scream")),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        browser.absorb(&res);
        let body = json_body(res).await;
        assert_eq!(body["status"], "initiated");
        assert_eq!(body["charged"], true);
        assert_eq!(body["action_id"], expected_action);
    }

    let res = test::call_service(
        &app,
        browser.request(test::TestRequest::post().uri("/api/activate/scream")),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body = json_body(res).await;
    assert_eq!(body["message"], "You are out of tokens!");

    wait_for_success(&store, 2).await;
    assert_eq!(store.actions().len(), 2);
    assert_eq!(executor.calls(), 2);
}

#[rstest]
#[actix_web::test]
async fn unknown_trigger_is_not_found_and_free() {
    let executor = Arc::new(ScriptedExecutor::succeeding());
    let (state, store) = in_memory_state(table(), executor.clone());
    let app = api_app!(state);
    let mut browser = Browser::default();

    let res = test::call_service(
        &app,
        browser.request(test::TestRequest::post().uri("/api/activate/ghost")),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    browser.absorb(&res);

    let res = test::call_service(
        &app,
        browser.request(test::TestRequest::get().uri("/api/user/status")),
    )
    .await;
    let body = json_body(res).await;
    assert_eq!(body["tokens_remaining"], 2);
    assert!(store.actions().is_empty());
    assert_eq!(executor.calls(), 0);
}

#[rstest]
#[actix_web::test]
async fn unknown_session_user_is_rejected_and_cleared() {
    let (state, store) = in_memory_state(table(), Arc::new(ScriptedExecutor::succeeding()));
    let app = api_app!(state);
    let mut browser = Browser::default();
    let stranger = UserId::random();

    let res = test::call_service(
        &app,
        browser.request(test::TestRequest::get().uri(&format!("/test/bind/{stranger}"))),
    )
    .await;
    browser.absorb(&res);

    let res = test::call_service(
        &app,
        browser.request(test::TestRequest::post().uri("/api/activate/scream")),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let removal = session_cookie(&res).expect("session cookie cleared");
    assert_eq!(removal.value(), "");
    let body = json_body(res).await;
    assert_eq!(body["message"], "invalid session, please refresh");
    assert!(store.actions().is_empty());
}

#[rstest]
#[actix_web::test]
async fn recharge_restores_allotment() {
    let (state, store) = in_memory_state(table(), Arc::new(ScriptedExecutor::succeeding()));
    let app = api_app!(state);
    let mut browser = Browser::default();

    let res = test::call_service(
        &app,
        browser.request(test::TestRequest::post().uri("/api/activate/scream")),
    )
    .await;
    browser.absorb(&res);

    let res = test::call_service(
        &app,
        browser.request(test::TestRequest::post().uri("/api/recharge")),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["tokens_remaining"], 2);
    assert_eq!(store.recharge_count(&user_id_of(&body)), 1);
}

#[rstest]
#[actix_web::test]
async fn stats_require_admin_session() {
    let (state, _store) = in_memory_state(table(), Arc::new(ScriptedExecutor::succeeding()));
    let app = api_app!(state);
    let mut browser = Browser::default();

    let res = test::call_service(&app, browser.request(test::TestRequest::get().uri("/api/stats"))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    browser.absorb(&res);

    let res = test::call_service(
        &app,
        browser.request(
            test::TestRequest::post()
                .uri("/api/admin/login")
                .set_json(json!({"admin_key": "guess"})),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = test::call_service(
        &app,
        browser.request(
            test::TestRequest::post()
                .uri("/api/admin/login")
                .set_json(json!({"admin_key": TEST_ADMIN_SECRET})),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    browser.absorb(&res);
    assert_eq!(json_body(res).await["is_admin"], true);

    let res = test::call_service(&app, browser.request(test::TestRequest::get().uri("/api/stats"))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let stats = json_body(res).await;
    assert_eq!(stats["total_users"], 2);
    assert_eq!(stats["activations_per_minute"].as_array().map(Vec::len), Some(60));
}

#[rstest]
#[actix_web::test]
async fn admin_activations_are_free_and_logout_starts_public_session() {
    let (state, store) = in_memory_state(table(), Arc::new(ScriptedExecutor::succeeding()));
    let app = api_app!(state);
    let mut browser = Browser::default();

    let res = test::call_service(
        &app,
        browser.request(
            test::TestRequest::post()
                .uri("/api/admin/login")
                .set_json(json!({"admin_key": TEST_ADMIN_SECRET})),
        ),
    )
    .await;
    browser.absorb(&res);
    let admin = user_id_of(&json_body(res).await);

    for _ in 0..3 {
        let res = test::call_service(
            &app,
            browser.request(test::TestRequest::post().uri("/api/activate/scream")),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        browser.absorb(&res);
        assert_eq!(json_body(res).await["charged"], false);
    }
    assert_eq!(store.balance(&admin), Some(2));
    wait_for_success(&store, 3).await;

    let res = test::call_service(
        &app,
        browser.request(test::TestRequest::post().uri("/api/admin/logout")),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    browser.absorb(&res);
    let public = json_body(res).await;
    assert_eq!(public["is_admin"], false);
    assert_ne!(user_id_of(&public), admin);
}

#[rstest]
#[actix_web::test]
async fn version_reports_package_version() {
    let (state, _store) = in_memory_state(table(), Arc::new(ScriptedExecutor::succeeding()));
    let app = api_app!(state);

    let res = test::call_service(&app, test::TestRequest::get().uri("/api/version").to_request()).await;

    assert_eq!(json_body(res).await["version"], env!("CARGO_PKG_VERSION"));
}
