//! `POST /api/activate/{trigger_id}`.
//!
//! Answers as soon as the token is debited and the action logged; the effect
//! runs after the response is sent.

use actix_web::{post, web};
use serde::Serialize;

use super::ApiResult;
use super::identity::current_user;
use super::session::VisitorSession;
use super::state::HttpState;
use crate::domain::{ActivationOutcome, Error, TriggerId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationResponse {
    pub status: &'static str,
    pub trigger_id: String,
    pub action_id: i64,
    pub charged: bool,
}

#[post("/activate/{trigger_id}")]
pub async fn activate(
    state: web::Data<HttpState>,
    session: VisitorSession,
    path: web::Path<String>,
) -> ApiResult<web::Json<ActivationResponse>> {
    let user = current_user(&session, &state).await?;
    let trigger_id = TriggerId::new(path.into_inner());

    match state.activation.activate(&user.caller(), &trigger_id).await? {
        ActivationOutcome::Initiated(ticket) => Ok(web::Json(ActivationResponse {
            status: "initiated",
            trigger_id: trigger_id.to_string(),
            action_id: ticket.action_id.get(),
            charged: ticket.charged,
        })),
        ActivationOutcome::InsufficientTokens => Err(Error::forbidden("You are out of tokens!")),
        ActivationOutcome::NotFound => Err(Error::not_found("Trigger not found")),
    }
}
