//! Actor extraction for the HTTP transport.
//!
//! The core only needs `(user_id, role, project_id)`; production deployments
//! put a real identity provider in front of this seam. The built-in
//! authenticator is the development header mode: it trusts the
//! `X-MigrateHub-*` headers, resolves the user from the catalog, and
//! provisions on first sight. It refuses to run in production (config
//! validation rejects it).

use std::future::Future;
use std::pin::Pin;

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use uuid::Uuid;

use crate::commands::ActorContext;
use crate::context::AppContext;
use crate::db::users;
use crate::error::AppError;
use crate::models::{Role, User};

/// Header carrying the authenticated email in dev header mode.
pub const EMAIL_HEADER: &str = "X-MigrateHub-Email";
/// Optional role override in dev header mode.
pub const ROLE_HEADER: &str = "X-MigrateHub-Role";
/// Optional display name used when auto-provisioning.
pub const NAME_HEADER: &str = "X-MigrateHub-Name";
/// Selected project scope.
pub const PROJECT_HEADER: &str = "X-MigrateHub-Project";

/// The authenticated user plus the selected project scope.
pub struct AuthenticatedUser {
    pub user: User,
    pub project_id: Option<Uuid>,
    role: Role,
}

impl AuthenticatedUser {
    pub fn actor(&self) -> ActorContext {
        ActorContext {
            user_id: self.user.id,
            role: self.role,
            project_id: self.project_id,
        }
    }
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let ctx = req
                .app_data::<web::Data<AppContext>>()
                .ok_or_else(|| AppError::Unauthorized("authenticator not configured".to_string()))?
                .clone();

            if !ctx.config.identity.dev_header_auth {
                return Err(AppError::Unauthorized(
                    "authentication required".to_string(),
                ));
            }

            let email = header(&req, EMAIL_HEADER)
                .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))?
                .to_lowercase();
            let name = header(&req, NAME_HEADER).unwrap_or(&email).to_string();

            let db = ctx.db.connection();
            let user = match users::find_by_email(db, &email).await? {
                Some(user) => user,
                // Dev header mode trusts the header identity, so first sight
                // provisions.
                None => users::find_or_create_external(db, &email, &email, &name, true).await?,
            };
            if user.is_disabled {
                return Err(AppError::Unauthorized("user disabled".to_string()));
            }

            // Dev-only: the role header may override the stored role.
            let role = header(&req, ROLE_HEADER)
                .and_then(Role::parse)
                .unwrap_or(user.role);

            let project_id = match header(&req, PROJECT_HEADER) {
                Some(raw) => Some(
                    Uuid::parse_str(raw)
                        .map_err(|_| AppError::Validation("invalid project id".to_string()))?,
                ),
                None => None,
            };

            Ok(AuthenticatedUser {
                user,
                project_id,
                role,
            })
        })
    }
}
