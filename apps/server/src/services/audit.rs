//! Audit writer: append-only event record for every state-changing action.
//!
//! Audit persistence is best-effort relative to the primary operation: a
//! failed write is logged and swallowed, never propagated. Every action still
//! attempts exactly one write.

use sea_orm::DatabaseConnection;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::db::audit_events;

pub struct Event<'a> {
    pub actor_id: Option<Uuid>,
    pub action: &'a str,
    pub entity_type: &'a str,
    pub entity_id: Option<Uuid>,
    pub payload: JsonValue,
}

/// Record one audit event. Failures are logged but never block the caller.
pub async fn record(db: &DatabaseConnection, event: Event<'_>) {
    if let Err(err) = audit_events::insert(
        db,
        event.actor_id,
        event.action,
        event.entity_type,
        event.entity_id,
        event.payload,
    )
    .await
    {
        tracing::error!(action = event.action, error = %err, "audit log failed");
    }
}
