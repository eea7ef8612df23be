use actix_web::{get, web, HttpResponse};
use log::error;

use crate::store::StatusStore;

/// Shared state handed to every HTTP worker. Read-only from the API's
/// perspective; the reconciler owns the writing side of the store.
#[derive(Clone)]
pub struct ApiState {
    pub store: StatusStore,
    pub refresh_interval: u64,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_status)
        .service(get_config)
        .service(dashboard)
        .service(actix_files::Files::new("/static", "static"));
}

/// Direct projection of the status table: one `[provider, status, detail]`
/// row per configured provider.
#[get("/status")]
async fn get_status(state: web::Data<ApiState>) -> actix_web::Result<HttpResponse> {
    let records = state.store.read_all().await.map_err(|e| {
        error!("Status read failed: {:#}", e);
        actix_web::error::ErrorInternalServerError("status store unavailable")
    })?;

    let incidents: Vec<_> = records
        .into_iter()
        .map(|r| (r.provider, r.status, r.detail))
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({ "incidents": incidents })))
}

#[get("/config")]
async fn get_config(state: web::Data<ApiState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "refresh_interval": state.refresh_interval }))
}

#[get("/")]
async fn dashboard() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(include_str!("../static/dashboard.html"))
}
