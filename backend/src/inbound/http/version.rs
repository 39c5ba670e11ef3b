//! `GET /api/version`.

use actix_web::{get, web};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct VersionInfo {
    pub version: &'static str,
}

#[get("/version")]
pub async fn version() -> web::Json<VersionInfo> {
    web::Json(VersionInfo {
        version: env!("CARGO_PKG_VERSION"),
    })
}
