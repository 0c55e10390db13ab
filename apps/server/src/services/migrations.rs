//! Migration service: catalog store operations for migrations plus their
//! audit events. When an update changes SQL, the store has already deleted
//! the approvals in the same transaction; this layer reports it.

use sea_orm::DatabaseConnection;
use serde_json::json;
use uuid::Uuid;

use crate::db::migrations;
use crate::error::AppResult;
use crate::models::{CreateMigrationInput, Migration, UpdateMigrationInput};
use crate::services::audit::{self, Event};

pub async fn create(
    db: &DatabaseConnection,
    project_id: Uuid,
    actor_id: Uuid,
    input: CreateMigrationInput,
) -> AppResult<Migration> {
    let migration = migrations::create(db, project_id, actor_id, input).await?;

    audit::record(
        db,
        Event {
            actor_id: Some(actor_id),
            action: "migration_created",
            entity_type: "migration",
            entity_id: Some(migration.id),
            payload: json!({
                "key": migration.key,
                "version": migration.version,
                "checksum_up": migration.checksum_up,
            }),
        },
    )
    .await;

    Ok(migration)
}

pub async fn update(
    db: &DatabaseConnection,
    project_id: Uuid,
    actor_id: Uuid,
    migration_id: Uuid,
    input: UpdateMigrationInput,
) -> AppResult<Migration> {
    let (migration, sql_changed) = migrations::update(db, project_id, migration_id, input).await?;

    if sql_changed {
        audit::record(
            db,
            Event {
                actor_id: Some(actor_id),
                action: "migration_approvals_invalidated",
                entity_type: "migration",
                entity_id: Some(migration.id),
                payload: json!({
                    "key": migration.key,
                    "version": migration.version,
                }),
            },
        )
        .await;
    }

    audit::record(
        db,
        Event {
            actor_id: Some(actor_id),
            action: "migration_updated",
            entity_type: "migration",
            entity_id: Some(migration.id),
            payload: json!({
                "key": migration.key,
                "version": migration.version,
                "sql_changed": sql_changed,
            }),
        },
    )
    .await;

    Ok(migration)
}
