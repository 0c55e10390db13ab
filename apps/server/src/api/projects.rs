//! Project management endpoints.

use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::commands;
use crate::context::AppContext;
use crate::error::AppResult;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_project)
        .service(list_projects)
        .service(get_project);
}

#[derive(Debug, Deserialize)]
struct CreateProjectRequest {
    name: String,
}

/// POST /projects - admin only.
#[post("/projects")]
async fn create_project(
    auth: AuthenticatedUser,
    body: web::Json<CreateProjectRequest>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    let project = commands::create_project(ctx.get_ref(), &auth.actor(), &body.name).await?;
    Ok(HttpResponse::Created().json(project))
}

/// GET /projects
#[get("/projects")]
async fn list_projects(
    auth: AuthenticatedUser,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    let projects = commands::list_projects(ctx.get_ref(), &auth.actor()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "projects": projects })))
}

/// GET /projects/{id}
#[get("/projects/{id}")]
async fn get_project(
    auth: AuthenticatedUser,
    path: web::Path<Uuid>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    let project = commands::get_project(ctx.get_ref(), &auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(project))
}
