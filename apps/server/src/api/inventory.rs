//! DB inventory endpoints: db-sets and db-targets.

use actix_web::{get, patch, post, web, HttpResponse};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::commands;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::models::{CreateTargetInput, Env, UpdateTargetInput};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_db_set)
        .service(list_db_sets)
        .service(disable_db_set)
        .service(create_db_target)
        .service(list_db_targets)
        .service(update_db_target)
        .service(disable_db_target)
        .service(test_target_connection);
}

#[derive(Debug, Deserialize)]
struct CreateDbSetRequest {
    env: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ListDbSetsQuery {
    env: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateTargetRequest {
    engine: String,
    host: String,
    port: i32,
    dbname: String,
    username: String,
    password: String,
    options: Option<JsonValue>,
}

/// POST /db-sets
#[post("/db-sets")]
async fn create_db_set(
    auth: AuthenticatedUser,
    body: web::Json<CreateDbSetRequest>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    let set = commands::create_db_set(ctx.get_ref(), &auth.actor(), &body.env, &body.name).await?;
    Ok(HttpResponse::Created().json(set))
}

/// GET /db-sets?env=stg
#[get("/db-sets")]
async fn list_db_sets(
    auth: AuthenticatedUser,
    query: web::Query<ListDbSetsQuery>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    let env_filter = query.env.as_deref().and_then(Env::parse);
    let sets = commands::list_db_sets(ctx.get_ref(), &auth.actor(), env_filter).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "db_sets": sets })))
}

/// POST /db-sets/{id}/disable - admin only.
#[post("/db-sets/{id}/disable")]
async fn disable_db_set(
    auth: AuthenticatedUser,
    path: web::Path<Uuid>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    commands::disable_db_set(ctx.get_ref(), &auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "disabled": true })))
}

/// POST /db-sets/{id}/targets
#[post("/db-sets/{id}/targets")]
async fn create_db_target(
    auth: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<CreateTargetRequest>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let target = commands::create_db_target(
        ctx.get_ref(),
        &auth.actor(),
        CreateTargetInput {
            db_set_id: path.into_inner(),
            engine: body.engine,
            host: body.host,
            port: body.port,
            dbname: body.dbname,
            username: body.username,
            password: body.password,
            options: body.options,
        },
    )
    .await?;
    Ok(HttpResponse::Created().json(target))
}

/// GET /db-sets/{id}/targets
#[get("/db-sets/{id}/targets")]
async fn list_db_targets(
    auth: AuthenticatedUser,
    path: web::Path<Uuid>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    let targets =
        commands::list_db_targets(ctx.get_ref(), &auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "db_targets": targets })))
}

/// PATCH /db-targets/{id}
#[patch("/db-targets/{id}")]
async fn update_db_target(
    auth: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateTargetInput>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    let target = commands::update_db_target(
        ctx.get_ref(),
        &auth.actor(),
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(target))
}

/// POST /db-targets/{id}/disable - admin only.
#[post("/db-targets/{id}/disable")]
async fn disable_db_target(
    auth: AuthenticatedUser,
    path: web::Path<Uuid>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    commands::disable_db_target(ctx.get_ref(), &auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "disabled": true })))
}

/// POST /db-targets/{id}/test-connection
#[post("/db-targets/{id}/test-connection")]
async fn test_target_connection(
    auth: AuthenticatedUser,
    path: web::Path<Uuid>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    commands::test_target_connection(ctx.get_ref(), &auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "ok": true })))
}
