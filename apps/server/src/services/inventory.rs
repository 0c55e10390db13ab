//! DB inventory services: db-sets and db-targets, plus the connection probe.

use sea_orm::DatabaseConnection;
use serde_json::json;
use uuid::Uuid;

use crate::db::{db_sets, db_targets};
use crate::error::{AppError, AppResult};
use crate::models::{CreateTargetInput, DbSet, DbTarget, UpdateTargetInput};
use crate::secret::SecretBox;
use crate::services::audit::{self, Event};
use crate::services::connector::TargetConnection;

pub async fn create_db_set(
    db: &DatabaseConnection,
    actor_id: Uuid,
    project_id: Uuid,
    env: &str,
    name: &str,
) -> AppResult<DbSet> {
    let set = db_sets::create(db, project_id, env, name, actor_id).await?;

    audit::record(
        db,
        Event {
            actor_id: Some(actor_id),
            action: "db_set_created",
            entity_type: "db_set",
            entity_id: Some(set.id),
            payload: json!({ "env": set.env, "name": set.name }),
        },
    )
    .await;

    Ok(set)
}

pub async fn disable_db_set(
    db: &DatabaseConnection,
    actor_id: Uuid,
    db_set_id: Uuid,
) -> AppResult<()> {
    db_sets::disable(db, db_set_id).await?;

    audit::record(
        db,
        Event {
            actor_id: Some(actor_id),
            action: "db_set_disabled",
            entity_type: "db_set",
            entity_id: Some(db_set_id),
            payload: json!({}),
        },
    )
    .await;

    Ok(())
}

pub async fn create_db_target(
    db: &DatabaseConnection,
    secrets: &SecretBox,
    actor_id: Uuid,
    input: CreateTargetInput,
) -> AppResult<DbTarget> {
    let target = db_targets::create(db, secrets, input).await?;

    audit::record(
        db,
        Event {
            actor_id: Some(actor_id),
            action: "db_target_created",
            entity_type: "db_target",
            entity_id: Some(target.id),
            payload: json!({
                "engine": target.engine,
                "host": target.host,
                "dbname": target.dbname,
            }),
        },
    )
    .await;

    Ok(target)
}

pub async fn update_db_target(
    db: &DatabaseConnection,
    secrets: &SecretBox,
    actor_id: Uuid,
    target_id: Uuid,
    input: UpdateTargetInput,
) -> AppResult<DbTarget> {
    let target = db_targets::update(db, secrets, target_id, input).await?;

    audit::record(
        db,
        Event {
            actor_id: Some(actor_id),
            action: "db_target_updated",
            entity_type: "db_target",
            entity_id: Some(target.id),
            payload: json!({ "host": target.host, "dbname": target.dbname }),
        },
    )
    .await;

    Ok(target)
}

pub async fn disable_db_target(
    db: &DatabaseConnection,
    actor_id: Uuid,
    target_id: Uuid,
) -> AppResult<()> {
    db_targets::disable(db, target_id).await?;

    audit::record(
        db,
        Event {
            actor_id: Some(actor_id),
            action: "db_target_disabled",
            entity_type: "db_target",
            entity_id: Some(target_id),
            payload: json!({}),
        },
    )
    .await;

    Ok(())
}

/// Open a connection to the target and ping it, without touching any
/// bookkeeping. Audits success and failure separately.
pub async fn test_target_connection(
    db: &DatabaseConnection,
    secrets: &SecretBox,
    actor_id: Uuid,
    target_id: Uuid,
) -> AppResult<()> {
    let result = probe(db, secrets, target_id).await;

    match &result {
        Ok(()) => {
            audit::record(
                db,
                Event {
                    actor_id: Some(actor_id),
                    action: "db_target_test_success",
                    entity_type: "db_target",
                    entity_id: Some(target_id),
                    payload: json!({}),
                },
            )
            .await;
        }
        Err(err) => {
            audit::record(
                db,
                Event {
                    actor_id: Some(actor_id),
                    action: "db_target_test_failed",
                    entity_type: "db_target",
                    entity_id: Some(target_id),
                    payload: json!({ "error": err.to_string() }),
                },
            )
            .await;
        }
    }

    result
}

async fn probe(
    db: &DatabaseConnection,
    secrets: &SecretBox,
    target_id: Uuid,
) -> AppResult<()> {
    let (target, password_enc) = db_targets::get_with_secret(db, target_id).await?;
    if !target.is_active {
        return Err(AppError::TargetDisabled);
    }
    let password_bytes = secrets.open(&password_enc)?;
    let password = String::from_utf8(password_bytes).map_err(|_| AppError::Crypto)?;

    let conn = TargetConnection::connect(&target, &password).await?;
    let result = conn.ping().await;
    conn.close().await;
    result
}
