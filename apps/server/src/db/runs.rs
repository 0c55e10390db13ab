//! Catalog store operations for runs, run items, and approval decisions.
//!
//! The run state machine lives here: request -> awaiting_approval ->
//! approved/denied -> running -> executed/failed. Transitions are guarded by
//! `WHERE status = ...` updates so concurrent workers cannot double-fire a
//! transition, and every gate re-reads the migration checksums against the
//! snapshot taken at request time.

use chrono::{DateTime, Utc};
use sea_orm::prelude::Expr;
use sea_orm::*;
use uuid::Uuid;

use crate::db::{db_sets, db_targets, migrations};
use crate::error::{AppError, AppResult};
use crate::models::{
    Decision, Env, Run, RunItem, RunItemStatus, RunStatus, RunType, RunWithItems,
};

pub struct RequestRun {
    pub project_id: Uuid,
    pub migration_id: Uuid,
    pub db_set_id: Uuid,
    pub env: String,
    pub run_type: Option<String>,
    pub requested_by: Uuid,
}

pub struct DecideRun {
    pub project_id: Uuid,
    pub run_id: Uuid,
    pub actor_id: Uuid,
    pub decision: Decision,
    pub comment: Option<String>,
}

/// Create a run in `awaiting_approval` with one queued item per active target.
///
/// Validates env and run type, requires sql_down for rollbacks, asserts the
/// db-set belongs to the same project and env, snapshots the migration
/// checksums, and inserts run + items in one transaction. The active-target
/// set is fixed here; targets disabled later still get their item attempted
/// and fail individually at execution time.
pub async fn request(db: &DatabaseConnection, input: RequestRun) -> AppResult<RunWithItems> {
    let env =
        Env::parse(&input.env).ok_or_else(|| AppError::Validation("invalid env".to_string()))?;
    let run_type = RunType::parse(input.run_type.as_deref().unwrap_or(""))
        .ok_or_else(|| AppError::Validation("invalid run type".to_string()))?;

    let mig = migrations::get(db, input.project_id, input.migration_id).await?;
    if run_type == RunType::Rollback
        && mig.sql_down.as_deref().map(str::trim).unwrap_or("").is_empty()
    {
        return Err(AppError::MissingSqlDown);
    }

    let set = db_sets::get(db, input.db_set_id).await?;
    if set.project_id != input.project_id {
        return Err(AppError::NotFound("db set".to_string()));
    }
    if set.env != env {
        return Err(AppError::Validation("db set env mismatch".to_string()));
    }

    let targets = db_targets::list_by_set(db, input.db_set_id).await?;
    let active: Vec<_> = targets.into_iter().filter(|t| t.is_active).collect();
    if active.is_empty() {
        return Err(AppError::NoActiveTargets);
    }

    let run_id = Uuid::new_v4();
    let now = Utc::now();

    let run = Run {
        id: run_id,
        run_type,
        migration_id: mig.id,
        project_id: input.project_id,
        env,
        db_set_id: input.db_set_id,
        status: RunStatus::AwaitingApproval,
        requested_by: input.requested_by,
        requested_at: now,
        approved_by: None,
        approved_at: None,
        approval_comment: None,
        executed_by: None,
        started_at: None,
        finished_at: None,
        checksum_up_at_request: mig.checksum_up.clone(),
        checksum_down_at_request: mig.checksum_down.clone(),
    };

    let txn = db.begin().await?;

    crate::entity::run::Entity::insert(crate::entity::run::ActiveModel {
        id: Set(run.id),
        run_type: Set(run.run_type.as_str().to_string()),
        migration_id: Set(run.migration_id),
        project_id: Set(run.project_id),
        env: Set(run.env.as_str().to_string()),
        db_set_id: Set(run.db_set_id),
        status: Set(run.status.as_str().to_string()),
        requested_by: Set(run.requested_by),
        requested_at: Set(run.requested_at),
        approved_by: Set(None),
        approved_at: Set(None),
        approval_comment: Set(None),
        executed_by: Set(None),
        started_at: Set(None),
        finished_at: Set(None),
        checksum_up_at_request: Set(run.checksum_up_at_request.clone()),
        checksum_down_at_request: Set(run.checksum_down_at_request.clone()),
    })
    .exec(&txn)
    .await?;

    let mut items = Vec::with_capacity(active.len());
    for target in &active {
        let item = RunItem {
            id: Uuid::new_v4(),
            run_id,
            db_target_id: target.id,
            status: RunItemStatus::Queued,
            started_at: None,
            finished_at: None,
            error: None,
            log: None,
        };
        crate::entity::run_item::Entity::insert(crate::entity::run_item::ActiveModel {
            id: Set(item.id),
            run_id: Set(item.run_id),
            db_target_id: Set(item.db_target_id),
            status: Set(item.status.as_str().to_string()),
            started_at: Set(None),
            finished_at: Set(None),
            error: Set(None),
            log: Set(None),
        })
        .exec(&txn)
        .await?;
        items.push(item);
    }

    txn.commit().await?;

    items.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(RunWithItems { run, items })
}

/// Decide a pending run. Approvals revalidate the migration checksums against
/// the request snapshot and append the immutable Approval row in the same
/// transaction that flips the run status; denials are terminal.
pub async fn decide(db: &DatabaseConnection, input: DecideRun) -> AppResult<Run> {
    let mut run = get(db, input.project_id, input.run_id).await?;
    if run.status != RunStatus::AwaitingApproval {
        return Err(AppError::InvalidStatus(
            "run is not awaiting approval".to_string(),
        ));
    }

    if input.decision == Decision::Approved {
        let mig = migrations::get(db, run.project_id, run.migration_id).await?;
        if mig.checksum_up != run.checksum_up_at_request
            || mig.checksum_down != run.checksum_down_at_request
        {
            return Err(AppError::ChecksumMismatch);
        }
    }

    let now = Utc::now();
    let comment = input
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let new_status = match input.decision {
        Decision::Approved => RunStatus::Approved,
        Decision::Denied => RunStatus::Denied,
    };

    let txn = db.begin().await?;

    let result = crate::entity::run::Entity::update_many()
        .col_expr(
            crate::entity::run::Column::Status,
            Expr::value(new_status.as_str()),
        )
        .col_expr(
            crate::entity::run::Column::ApprovedBy,
            Expr::value(input.actor_id),
        )
        .col_expr(crate::entity::run::Column::ApprovedAt, Expr::value(now))
        .col_expr(
            crate::entity::run::Column::ApprovalComment,
            Expr::value(comment.clone()),
        )
        .filter(crate::entity::run::Column::Id.eq(run.id))
        .filter(
            crate::entity::run::Column::Status.eq(RunStatus::AwaitingApproval.as_str()),
        )
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        // Another decision won the race.
        return Err(AppError::InvalidStatus(
            "run is not awaiting approval".to_string(),
        ));
    }

    crate::entity::approval::Entity::insert(crate::entity::approval::ActiveModel {
        id: Set(Uuid::new_v4()),
        migration_id: Set(run.migration_id),
        env: Set(run.env.as_str().to_string()),
        decision: Set(input.decision.as_str().to_string()),
        comment: Set(comment.clone()),
        decided_by: Set(input.actor_id),
        decided_at: Set(now),
        checksum_up_at_decision: Set(run.checksum_up_at_request.clone()),
        checksum_down_at_decision: Set(run.checksum_down_at_request.clone()),
    })
    .exec(&txn)
    .await?;

    txn.commit().await?;

    run.status = new_status;
    run.approved_by = Some(input.actor_id);
    run.approved_at = Some(now);
    run.approval_comment = comment;
    Ok(run)
}

pub async fn get(db: &DatabaseConnection, project_id: Uuid, run_id: Uuid) -> AppResult<Run> {
    let model = crate::entity::run::Entity::find_by_id(run_id)
        .filter(crate::entity::run::Column::ProjectId.eq(project_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("run".to_string()))?;
    model_to_run(model)
}

pub async fn get_with_items(
    db: &DatabaseConnection,
    project_id: Uuid,
    run_id: Uuid,
) -> AppResult<RunWithItems> {
    let run = get(db, project_id, run_id).await?;
    let items = list_items(db, run_id).await?;
    Ok(RunWithItems { run, items })
}

/// Items of a run in id order, which is also their execution order.
pub async fn list_items(db: &DatabaseConnection, run_id: Uuid) -> AppResult<Vec<RunItem>> {
    let models = crate::entity::run_item::Entity::find()
        .filter(crate::entity::run_item::Column::RunId.eq(run_id))
        .order_by_asc(crate::entity::run_item::Column::Id)
        .all(db)
        .await?;
    models.into_iter().map(model_to_item).collect()
}

pub async fn list_for_migration(
    db: &DatabaseConnection,
    project_id: Uuid,
    migration_id: Uuid,
) -> AppResult<Vec<Run>> {
    let models = crate::entity::run::Entity::find()
        .filter(crate::entity::run::Column::ProjectId.eq(project_id))
        .filter(crate::entity::run::Column::MigrationId.eq(migration_id))
        .order_by_desc(crate::entity::run::Column::RequestedAt)
        .all(db)
        .await?;
    models.into_iter().map(model_to_run).collect()
}

/// Transition approved -> running, claiming the run for `actor_id`. The
/// status guard makes concurrent execute calls lose cleanly.
pub async fn mark_running(
    db: &DatabaseConnection,
    run_id: Uuid,
    actor_id: Uuid,
    started_at: DateTime<Utc>,
) -> AppResult<()> {
    let result = crate::entity::run::Entity::update_many()
        .col_expr(
            crate::entity::run::Column::Status,
            Expr::value(RunStatus::Running.as_str()),
        )
        .col_expr(crate::entity::run::Column::ExecutedBy, Expr::value(actor_id))
        .col_expr(crate::entity::run::Column::StartedAt, Expr::value(started_at))
        .filter(crate::entity::run::Column::Id.eq(run_id))
        .filter(crate::entity::run::Column::Status.eq(RunStatus::Approved.as_str()))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::InvalidStatus(
            "run must be approved before execution".to_string(),
        ));
    }
    Ok(())
}

/// Finalize a run as executed or failed.
pub async fn finish(
    db: &DatabaseConnection,
    run_id: Uuid,
    status: RunStatus,
    finished_at: DateTime<Utc>,
) -> AppResult<()> {
    crate::entity::run::Entity::update_many()
        .col_expr(
            crate::entity::run::Column::Status,
            Expr::value(status.as_str()),
        )
        .col_expr(
            crate::entity::run::Column::FinishedAt,
            Expr::value(finished_at),
        )
        .filter(crate::entity::run::Column::Id.eq(run_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Update a run item's status and bookkeeping fields. `None` keeps the
/// current value.
pub async fn update_item(
    db: &DatabaseConnection,
    item_id: Uuid,
    status: RunItemStatus,
    error: Option<String>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
) -> AppResult<()> {
    let mut active = crate::entity::run_item::ActiveModel {
        id: Unchanged(item_id),
        status: Set(status.as_str().to_string()),
        ..Default::default()
    };
    if error.is_some() {
        active.error = Set(error);
    }
    if let Some(at) = started_at {
        active.started_at = Set(Some(at));
    }
    if let Some(at) = finished_at {
        active.finished_at = Set(Some(at));
    }
    active.update(db).await?;
    Ok(())
}

fn model_to_run(m: crate::entity::run::Model) -> AppResult<Run> {
    let run_type = RunType::parse(&m.run_type)
        .ok_or_else(|| AppError::Database(format!("unknown run_type in catalog: {}", m.run_type)))?;
    let env = Env::parse(&m.env)
        .ok_or_else(|| AppError::Database(format!("unknown env in catalog: {}", m.env)))?;
    let status = RunStatus::parse(&m.status)
        .ok_or_else(|| AppError::Database(format!("unknown run status in catalog: {}", m.status)))?;
    Ok(Run {
        id: m.id,
        run_type,
        migration_id: m.migration_id,
        project_id: m.project_id,
        env,
        db_set_id: m.db_set_id,
        status,
        requested_by: m.requested_by,
        requested_at: m.requested_at,
        approved_by: m.approved_by,
        approved_at: m.approved_at,
        approval_comment: m.approval_comment,
        executed_by: m.executed_by,
        started_at: m.started_at,
        finished_at: m.finished_at,
        checksum_up_at_request: m.checksum_up_at_request,
        checksum_down_at_request: m.checksum_down_at_request,
    })
}

fn model_to_item(m: crate::entity::run_item::Model) -> AppResult<RunItem> {
    let status = RunItemStatus::parse(&m.status).ok_or_else(|| {
        AppError::Database(format!("unknown run item status in catalog: {}", m.status))
    })?;
    Ok(RunItem {
        id: m.id,
        run_id: m.run_id,
        db_target_id: m.db_target_id,
        status,
        started_at: m.started_at,
        finished_at: m.finished_at,
        error: m.error,
        log: m.log,
    })
}
