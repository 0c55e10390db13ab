//! Run endpoints: inspection, decisions, execution.

use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::commands;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::models::{DecideRunInput, Decision};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_run)
        .service(approve_run)
        .service(deny_run)
        .service(execute_run);
}

#[derive(Debug, Default, Deserialize)]
struct DecisionRequest {
    comment: Option<String>,
}

/// GET /runs/{id}
#[get("/runs/{id}")]
async fn get_run(
    auth: AuthenticatedUser,
    path: web::Path<Uuid>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    let run = commands::get_run(ctx.get_ref(), &auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(run))
}

/// POST /runs/{id}/approve - manager or admin.
#[post("/runs/{id}/approve")]
async fn approve_run(
    auth: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<DecisionRequest>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    let run = commands::decide_run(
        ctx.get_ref(),
        &auth.actor(),
        path.into_inner(),
        DecideRunInput {
            decision: Decision::Approved,
            comment: body.comment.clone(),
        },
    )
    .await?;
    Ok(HttpResponse::Ok().json(run))
}

/// POST /runs/{id}/deny - manager or admin.
#[post("/runs/{id}/deny")]
async fn deny_run(
    auth: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<DecisionRequest>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    let run = commands::decide_run(
        ctx.get_ref(),
        &auth.actor(),
        path.into_inner(),
        DecideRunInput {
            decision: Decision::Denied,
            comment: body.comment.clone(),
        },
    )
    .await?;
    Ok(HttpResponse::Ok().json(run))
}

/// POST /runs/{id}/execute
#[post("/runs/{id}/execute")]
async fn execute_run(
    auth: AuthenticatedUser,
    path: web::Path<Uuid>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    let run = commands::execute_run(ctx.get_ref(), &auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(run))
}
