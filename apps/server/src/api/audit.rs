//! Audit event feed.

use actix_web::{get, web, HttpResponse};
use serde::Deserialize;

use crate::auth::AuthenticatedUser;
use crate::commands;
use crate::context::AppContext;
use crate::error::AppResult;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_audit_events);
}

#[derive(Debug, Deserialize)]
struct AuditQuery {
    limit: Option<u64>,
}

/// GET /audit-events?limit=100 - admin only.
#[get("/audit-events")]
async fn list_audit_events(
    auth: AuthenticatedUser,
    query: web::Query<AuditQuery>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    let events = commands::list_audit_events(ctx.get_ref(), &auth.actor(), query.limit).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "events": events })))
}
