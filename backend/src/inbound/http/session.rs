//! The visitor's cookie session.
//!
//! Only the user id is stored in the cookie. Balances and the admin flag are
//! read from the store on every request so a recharge shows up immediately.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";

/// What the cookie says about who is calling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionIdentity {
    Anonymous,
    Known(UserId),
    /// The stored value is not a user id. Handled like an unknown user.
    Invalid,
}

impl SessionIdentity {
    fn decode(raw: Option<String>) -> Self {
        let Some(raw) = raw else {
            return Self::Anonymous;
        };
        UserId::new(raw).map_or_else(
            |error| {
                warn!(%error, "session cookie holds a malformed user id");
                Self::Invalid
            },
            Self::Known,
        )
    }
}

/// Extractor over the actix session with the dashboard's few operations.
#[derive(Clone)]
pub struct VisitorSession(Session);

impl VisitorSession {
    /// Store `user_id` and issue a fresh cookie.
    pub fn bind(&self, user_id: &UserId) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USER_ID_KEY, user_id.to_string())
            .map_err(|error| Error::internal(format!("cannot write session cookie: {error}")))
    }

    pub fn identity(&self) -> Result<SessionIdentity, Error> {
        self.0
            .get::<String>(USER_ID_KEY)
            .map(SessionIdentity::decode)
            .map_err(|error| Error::internal(format!("cannot read session cookie: {error}")))
    }

    /// Empty the session and expire the cookie.
    pub fn forget(&self) {
        self.0.purge();
    }
}

impl FromRequest for VisitorSession {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let session = Session::from_request(req, payload);
        Box::pin(async move { Ok(Self(session.await?)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};

    const FIXTURE_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    fn describe(user: SessionIdentity) -> String {
        match user {
            SessionIdentity::Anonymous => "anonymous".to_owned(),
            SessionIdentity::Known(id) => id.to_string(),
            SessionIdentity::Invalid => "invalid".to_owned(),
        }
    }

    #[actix_web::test]
    async fn round_trips_user_id_and_clears() {
        let app = test::init_service(
            App::new()
                .wrap(crate::inbound::http::test_utils::test_session_middleware())
                .route(
                    "/set",
                    web::get().to(|session: VisitorSession| async move {
                        let id = UserId::new(FIXTURE_ID).expect("fixture id");
                        session.bind(&id)?;
                        Ok::<_, Error>(HttpResponse::Ok())
                    }),
                )
                .route(
                    "/get",
                    web::get().to(|session: VisitorSession| async move {
                        Ok::<_, Error>(HttpResponse::Ok().body(describe(session.identity()?)))
                    }),
                )
                .route(
                    "/clear",
                    web::get().to(|session: VisitorSession| async move {
                        session.forget();
                        HttpResponse::Ok()
                    }),
                ),
        )
        .await;

        let anonymous =
            test::call_service(&app, test::TestRequest::get().uri("/get").to_request()).await;
        assert_eq!(test::read_body(anonymous).await, "anonymous");

        let set_res =
            test::call_service(&app, test::TestRequest::get().uri("/set").to_request()).await;
        assert_eq!(set_res.status(), StatusCode::OK);
        let cookie = set_res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie set")
            .into_owned();

        let get_res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/get")
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        assert_eq!(test::read_body(get_res).await, FIXTURE_ID);

        let clear_res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/clear")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        let removal = clear_res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("removal cookie");
        assert_eq!(removal.value(), "");
    }

    #[actix_web::test]
    async fn malformed_id_is_invalid() {
        let app = test::init_service(
            App::new()
                .wrap(crate::inbound::http::test_utils::test_session_middleware())
                .route(
                    "/tamper",
                    web::get().to(|session: actix_session::Session| async move {
                        session
                            .insert(USER_ID_KEY, "not-a-uuid")
                            .expect("insert fixture");
                        HttpResponse::Ok()
                    }),
                )
                .route(
                    "/get",
                    web::get().to(|session: VisitorSession| async move {
                        Ok::<_, Error>(HttpResponse::Ok().body(describe(session.identity()?)))
                    }),
                ),
        )
        .await;

        let tamper =
            test::call_service(&app, test::TestRequest::get().uri("/tamper").to_request()).await;
        let cookie = tamper
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie")
            .into_owned();

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/get").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(test::read_body(res).await, "invalid");
    }
}
