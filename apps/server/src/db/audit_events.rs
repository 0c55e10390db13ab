//! Catalog store operations for audit events. Insert and read only; the table
//! has no update or delete path.

use chrono::Utc;
use sea_orm::*;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::AuditEvent;

pub async fn insert(
    db: &DatabaseConnection,
    actor_id: Option<Uuid>,
    action: &str,
    entity_type: &str,
    entity_id: Option<Uuid>,
    payload: JsonValue,
) -> AppResult<AuditEvent> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    crate::entity::audit_event::Entity::insert(crate::entity::audit_event::ActiveModel {
        id: Set(id),
        actor_id: Set(actor_id),
        action: Set(action.to_string()),
        entity_type: Set(entity_type.to_string()),
        entity_id: Set(entity_id),
        payload: Set(payload.clone()),
        created_at: Set(now),
    })
    .exec(db)
    .await?;

    Ok(AuditEvent {
        id,
        actor_id,
        action: action.to_string(),
        entity_type: entity_type.to_string(),
        entity_id,
        payload,
        created_at: now,
    })
}

pub async fn list_recent(db: &DatabaseConnection, limit: u64) -> AppResult<Vec<AuditEvent>> {
    let models = crate::entity::audit_event::Entity::find()
        .order_by_desc(crate::entity::audit_event::Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await?;
    Ok(models
        .into_iter()
        .map(|m| AuditEvent {
            id: m.id,
            actor_id: m.actor_id,
            action: m.action,
            entity_type: m.entity_type,
            entity_id: m.entity_id,
            payload: m.payload,
            created_at: m.created_at,
        })
        .collect())
}
