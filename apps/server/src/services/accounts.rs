//! User and project management services with their audit events.

use sea_orm::DatabaseConnection;
use serde_json::json;
use uuid::Uuid;

use crate::db::{projects, users};
use crate::error::AppResult;
use crate::models::{CreateUserInput, Project, UpdateUserInput, User};
use crate::services::audit::{self, Event};

pub async fn create_project(
    db: &DatabaseConnection,
    actor_id: Uuid,
    name: &str,
) -> AppResult<Project> {
    let project = projects::create(db, name).await?;

    audit::record(
        db,
        Event {
            actor_id: Some(actor_id),
            action: "project_created",
            entity_type: "project",
            entity_id: Some(project.id),
            payload: json!({ "name": project.name }),
        },
    )
    .await;

    Ok(project)
}

pub async fn create_user(
    db: &DatabaseConnection,
    actor_id: Uuid,
    input: CreateUserInput,
) -> AppResult<User> {
    let user = users::create(db, input).await?;

    audit::record(
        db,
        Event {
            actor_id: Some(actor_id),
            action: "user_created",
            entity_type: "user",
            entity_id: Some(user.id),
            payload: json!({ "email": user.email, "role": user.role }),
        },
    )
    .await;

    Ok(user)
}

pub async fn update_user(
    db: &DatabaseConnection,
    actor_id: Uuid,
    user_id: Uuid,
    input: UpdateUserInput,
) -> AppResult<User> {
    let user = users::update(db, user_id, input).await?;

    audit::record(
        db,
        Event {
            actor_id: Some(actor_id),
            action: "user_updated",
            entity_type: "user",
            entity_id: Some(user.id),
            payload: json!({ "name": user.name, "role": user.role }),
        },
    )
    .await;

    Ok(user)
}

pub async fn disable_user(
    db: &DatabaseConnection,
    actor_id: Uuid,
    user_id: Uuid,
) -> AppResult<()> {
    users::disable(db, user_id).await?;

    audit::record(
        db,
        Event {
            actor_id: Some(actor_id),
            action: "user_disabled",
            entity_type: "user",
            entity_id: Some(user_id),
            payload: json!({}),
        },
    )
    .await;

    Ok(())
}

/// Resolve an external login to a catalog user, provisioning when policy
/// allows, and record the login.
pub async fn login_external(
    db: &DatabaseConnection,
    subject: &str,
    email: &str,
    name: &str,
    allow_auto_provision: bool,
) -> AppResult<User> {
    let user = users::find_or_create_external(db, subject, email, name, allow_auto_provision).await?;

    audit::record(
        db,
        Event {
            actor_id: Some(user.id),
            action: "login_success",
            entity_type: "user",
            entity_id: Some(user.id),
            payload: json!({ "email": user.email }),
        },
    )
    .await;

    Ok(user)
}
