//! `GET /api/triggers`: the current trigger table without device secrets.

use actix_web::{get, web};
use serde::Serialize;

use super::ApiResult;
use super::state::HttpState;
use crate::domain::Trigger;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerView {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<&Trigger> for TriggerView {
    fn from(trigger: &Trigger) -> Self {
        Self {
            id: trigger.id.to_string(),
            name: trigger.name.clone(),
            description: trigger.description.clone(),
            kind: trigger.kind.type_name().to_owned(),
        }
    }
}

#[get("/triggers")]
pub async fn list_triggers(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<TriggerView>>> {
    let table = state.triggers.current();
    Ok(web::Json(table.iter().map(TriggerView::from).collect()))
}
