//! Health check endpoint.

use actix_web::{get, web, HttpResponse};

use crate::context::AppContext;
use crate::error::AppResult;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health);
}

/// GET /health - liveness plus a catalog ping.
#[get("/health")]
async fn health(ctx: web::Data<AppContext>) -> AppResult<HttpResponse> {
    ctx.db
        .connection()
        .ping()
        .await
        .map_err(|e| crate::error::AppError::Database(e.to_string()))?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}
