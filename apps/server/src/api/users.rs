//! User management and login endpoints.

use actix_web::{get, patch, post, web, HttpRequest, HttpResponse};
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, EMAIL_HEADER, NAME_HEADER};
use crate::commands;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::models::{CreateUserInput, UpdateUserInput};
use crate::services::accounts;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(login)
        .service(me)
        .service(create_user)
        .service(list_users)
        .service(update_user)
        .service(disable_user);
}

/// POST /auth/login - resolve the external identity to a catalog user and
/// record the login. In dev header mode the identity comes from headers; a
/// production deployment terminates OIDC in front of this route.
#[post("/auth/login")]
async fn login(req: HttpRequest, ctx: web::Data<AppContext>) -> AppResult<HttpResponse> {
    if !ctx.config.identity.dev_header_auth {
        return Err(AppError::Unauthorized(
            "authentication required".to_string(),
        ));
    }
    let email = req
        .headers()
        .get(EMAIL_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))?;
    let name = req
        .headers()
        .get(NAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(email);

    let user = accounts::login_external(ctx.db.connection(), email, email, name, true).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// GET /auth/me
#[get("/auth/me")]
async fn me(auth: AuthenticatedUser) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(&auth.user))
}

/// POST /users - admin only.
#[post("/users")]
async fn create_user(
    auth: AuthenticatedUser,
    body: web::Json<CreateUserInput>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    let user = commands::create_user(ctx.get_ref(), &auth.actor(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}

/// GET /users - admin only.
#[get("/users")]
async fn list_users(auth: AuthenticatedUser, ctx: web::Data<AppContext>) -> AppResult<HttpResponse> {
    let users = commands::list_users(ctx.get_ref(), &auth.actor()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "users": users })))
}

/// PATCH /users/{id} - admin only.
#[patch("/users/{id}")]
async fn update_user(
    auth: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateUserInput>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    let user = commands::update_user(
        ctx.get_ref(),
        &auth.actor(),
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(user))
}

/// POST /users/{id}/disable - admin only.
#[post("/users/{id}/disable")]
async fn disable_user(
    auth: AuthenticatedUser,
    path: web::Path<Uuid>,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    commands::disable_user(ctx.get_ref(), &auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "disabled": true })))
}
