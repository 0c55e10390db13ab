//! Catalog store operations for users.
//!
//! Emails are normalized to lowercase before any lookup or insert. Disabled
//! users never authenticate; reads used by the authenticator reject them.

use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::*;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{CreateUserInput, Role, UpdateUserInput, User};

/// Find an enabled user by id. Used by the authenticator; disabled users are
/// rejected here rather than at every call site.
pub async fn get(db: &DatabaseConnection, id: Uuid) -> AppResult<User> {
    let model = crate::entity::user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("user".to_string()))?;
    if model.is_disabled {
        return Err(AppError::Unauthorized("user disabled".to_string()));
    }
    model_to_user(model)
}

/// Find a user by id regardless of disabled state (admin views).
pub async fn get_record(db: &DatabaseConnection, id: Uuid) -> AppResult<User> {
    let model = crate::entity::user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("user".to_string()))?;
    model_to_user(model)
}

/// Find a user by (lowercased) email. Returns disabled users too; callers
/// that authenticate must reject them.
pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> AppResult<Option<User>> {
    let model = crate::entity::user::Entity::find()
        .filter(crate::entity::user::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await?;
    model.map(model_to_user).transpose()
}

pub async fn list(db: &DatabaseConnection) -> AppResult<Vec<User>> {
    let models = crate::entity::user::Entity::find()
        .order_by_asc(crate::entity::user::Column::Email)
        .all(db)
        .await?;
    models.into_iter().map(model_to_user).collect()
}

pub async fn create(db: &DatabaseConnection, input: CreateUserInput) -> AppResult<User> {
    let email = input.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(AppError::Validation("email required".to_string()));
    }
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("name required".to_string()));
    }
    let role = input.role.unwrap_or_default();

    let id = Uuid::new_v4();
    let now = Utc::now();

    let model = crate::entity::user::ActiveModel {
        id: Set(id),
        email: Set(email),
        name: Set(name),
        role: Set(role.as_str().to_string()),
        provider: Set("oidc".to_string()),
        external_subject: Set(None),
        is_disabled: Set(false),
        last_login_at: Set(None),
        created_at: Set(now),
    };

    crate::entity::user::Entity::insert(model)
        .exec(db)
        .await
        .map_err(|e| {
            if crate::db::is_unique_violation(&e) {
                AppError::Conflict("email already exists".to_string())
            } else {
                e.into()
            }
        })?;

    get_record(db, id).await
}

pub async fn update(db: &DatabaseConnection, id: Uuid, input: UpdateUserInput) -> AppResult<User> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("name required".to_string()));
    }

    let model = crate::entity::user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("user".to_string()))?;

    let mut active: crate::entity::user::ActiveModel = model.into();
    active.name = Set(name);
    active.role = Set(input.role.as_str().to_string());
    let updated = active.update(db).await?;

    model_to_user(updated)
}

pub async fn disable(db: &DatabaseConnection, id: Uuid) -> AppResult<()> {
    let result = crate::entity::user::Entity::update_many()
        .col_expr(crate::entity::user::Column::IsDisabled, Expr::value(true))
        .filter(crate::entity::user::Column::Id.eq(id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("user".to_string()));
    }
    Ok(())
}

/// Find or create a user from an external identity, in precedence order:
/// subject match, then pre-provisioned email match (linking the subject), then
/// auto-provisioning when policy allows. Updates `last_login_at` on success.
pub async fn find_or_create_external(
    db: &DatabaseConnection,
    subject: &str,
    email: &str,
    name: &str,
    allow_auto_provision: bool,
) -> AppResult<User> {
    let email = email.trim().to_lowercase();

    let by_subject = crate::entity::user::Entity::find()
        .filter(crate::entity::user::Column::ExternalSubject.eq(subject))
        .one(db)
        .await?;
    if let Some(model) = by_subject {
        return touch_login(db, model).await;
    }

    let by_email = crate::entity::user::Entity::find()
        .filter(crate::entity::user::Column::Email.eq(email.clone()))
        .one(db)
        .await?;
    if let Some(model) = by_email {
        if model.external_subject.as_deref().unwrap_or("").is_empty() {
            let mut active: crate::entity::user::ActiveModel = model.into();
            active.external_subject = Set(Some(subject.to_string()));
            let linked = active.update(db).await?;
            return touch_login(db, linked).await;
        }
        return touch_login(db, model).await;
    }

    if !allow_auto_provision {
        return Err(AppError::NotFound("user".to_string()));
    }

    let id = Uuid::new_v4();
    let now = Utc::now();
    let model = crate::entity::user::ActiveModel {
        id: Set(id),
        email: Set(email),
        name: Set(name.trim().to_string()),
        role: Set(Role::User.as_str().to_string()),
        provider: Set("oidc".to_string()),
        external_subject: Set(Some(subject.to_string())),
        is_disabled: Set(false),
        last_login_at: Set(Some(now)),
        created_at: Set(now),
    };
    crate::entity::user::Entity::insert(model).exec(db).await?;

    get_record(db, id).await
}

async fn touch_login(
    db: &DatabaseConnection,
    model: crate::entity::user::Model,
) -> AppResult<User> {
    if model.is_disabled {
        return Err(AppError::Unauthorized("user disabled".to_string()));
    }
    let mut active: crate::entity::user::ActiveModel = model.into();
    active.last_login_at = Set(Some(Utc::now()));
    let updated = active.update(db).await?;
    model_to_user(updated)
}

fn model_to_user(m: crate::entity::user::Model) -> AppResult<User> {
    let role = Role::parse(&m.role)
        .ok_or_else(|| AppError::Database(format!("unknown role in catalog: {}", m.role)))?;
    Ok(User {
        id: m.id,
        email: m.email,
        name: m.name,
        role,
        provider: m.provider,
        external_subject: m.external_subject,
        is_disabled: m.is_disabled,
        last_login_at: m.last_login_at,
        created_at: m.created_at,
    })
}
