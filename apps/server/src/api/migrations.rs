//! Migration endpoints, including run requests scoped to a migration.

use actix_web::{get, patch, post, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::commands;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::models::{CreateMigrationInput, RequestRunInput, UpdateMigrationInput};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_migration)
        .service(list_migrations)
        .service(get_migration)
        .service(update_migration)
        .service(list_approvals)
        .service(list_runs)
        .service(request_approval)
        .service(request_rollback);
}

#[derive(Debug, Deserialize)]
struct ListMigrationsQuery {
    search: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RequestRunRequest {
    env: String,
    db_set_id: Uuid,
}

/// POST /migrations
#[post("/migrations")]
async fn create_migration(
    auth: AuthenticatedUser,
    body: web::Json<CreateMigrationInput>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    let migration =
        commands::create_migration(ctx.get_ref(), &auth.actor(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(migration))
}

/// GET /migrations?search=...
#[get("/migrations")]
async fn list_migrations(
    auth: AuthenticatedUser,
    query: web::Query<ListMigrationsQuery>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    let migrations =
        commands::list_migrations(ctx.get_ref(), &auth.actor(), query.search.as_deref()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "migrations": migrations })))
}

/// GET /migrations/{id}
#[get("/migrations/{id}")]
async fn get_migration(
    auth: AuthenticatedUser,
    path: web::Path<Uuid>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    let migration =
        commands::get_migration(ctx.get_ref(), &auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(migration))
}

/// PATCH /migrations/{id}
#[patch("/migrations/{id}")]
async fn update_migration(
    auth: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateMigrationInput>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    let migration = commands::update_migration(
        ctx.get_ref(),
        &auth.actor(),
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(migration))
}

/// GET /migrations/{id}/approvals
#[get("/migrations/{id}/approvals")]
async fn list_approvals(
    auth: AuthenticatedUser,
    path: web::Path<Uuid>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    let approvals =
        commands::list_approvals(ctx.get_ref(), &auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "approvals": approvals })))
}

/// GET /migrations/{id}/runs
#[get("/migrations/{id}/runs")]
async fn list_runs(
    auth: AuthenticatedUser,
    path: web::Path<Uuid>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    let runs =
        commands::list_runs_for_migration(ctx.get_ref(), &auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "runs": runs })))
}

/// POST /migrations/{id}/request-approval
#[post("/migrations/{id}/request-approval")]
async fn request_approval(
    auth: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<RequestRunRequest>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    let run = commands::request_run(
        ctx.get_ref(),
        &auth.actor(),
        RequestRunInput {
            migration_id: path.into_inner(),
            db_set_id: body.db_set_id,
            env: body.env.clone(),
            run_type: Some("apply".to_string()),
        },
    )
    .await?;
    Ok(HttpResponse::Created().json(run))
}

/// POST /migrations/{id}/request-rollback
#[post("/migrations/{id}/request-rollback")]
async fn request_rollback(
    auth: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<RequestRunRequest>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    let run = commands::request_run(
        ctx.get_ref(),
        &auth.actor(),
        RequestRunInput {
            migration_id: path.into_inner(),
            db_set_id: body.db_set_id,
            env: body.env.clone(),
            run_type: Some("rollback".to_string()),
        },
    )
    .await?;
    Ok(HttpResponse::Created().json(run))
}
