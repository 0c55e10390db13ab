//! Run coordinator: request and decide transitions with their audit events.
//!
//! Role enforcement stays in the command surface; this layer owns the state
//! machine semantics (delegated to the store) and the audit trail.

use sea_orm::DatabaseConnection;
use serde_json::json;
use uuid::Uuid;

use crate::db::runs;
use crate::error::AppResult;
use crate::models::{Decision, Run, RunType, RunWithItems};
use crate::services::audit::{self, Event};

pub async fn request(db: &DatabaseConnection, input: runs::RequestRun) -> AppResult<RunWithItems> {
    let actor_id = input.requested_by;
    let run = runs::request(db, input).await?;

    let action = match run.run.run_type {
        RunType::Apply => "run_requested",
        RunType::Rollback => "rollback_requested",
    };
    audit::record(
        db,
        Event {
            actor_id: Some(actor_id),
            action,
            entity_type: "run",
            entity_id: Some(run.run.id),
            payload: json!({
                "migration_id": run.run.migration_id,
                "env": run.run.env,
                "db_set_id": run.run.db_set_id,
            }),
        },
    )
    .await;

    Ok(run)
}

pub async fn decide(db: &DatabaseConnection, input: runs::DecideRun) -> AppResult<Run> {
    let actor_id = input.actor_id;
    let comment = input.comment.clone();
    let decision = input.decision;
    let run = runs::decide(db, input).await?;

    let action = match decision {
        Decision::Approved => "run_approved",
        Decision::Denied => "run_denied",
    };
    audit::record(
        db,
        Event {
            actor_id: Some(actor_id),
            action,
            entity_type: "run",
            entity_id: Some(run.id),
            payload: json!({
                "migration_id": run.migration_id,
                "env": run.env,
                "db_set_id": run.db_set_id,
                "comment": comment,
            }),
        },
    )
    .await;

    Ok(run)
}
