//! Execution engine: applies an approved run against its targets.
//!
//! The engine is the only component that opens connections to target
//! databases. Items execute sequentially in id order; the first failure
//! aborts the run, leaving already-applied targets applied. Replaying a run
//! against the same db-set is safe because applied targets reconcile to
//! `skipped`.

use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde_json::json;
use uuid::Uuid;

use crate::db::{db_targets, migrations, runs};
use crate::error::{AppError, AppResult};
use crate::models::{
    Migration, Run, RunItem, RunItemStatus, RunStatus, RunType, RunWithItems, TransactionMode,
};
use crate::secret::SecretBox;
use crate::services::audit::{self, Event};
use crate::services::connector::{AppliedRow, TargetConnection};

enum ItemOutcome {
    Executed,
    Skipped(&'static str),
}

/// Execute an approved run.
///
/// Preconditions, checked in order without modifying state: the run exists,
/// its status is `approved`, and the migration checksums still match the
/// snapshot taken at request time. Per-target failures are recorded on the
/// run item and finalize the run as `failed`; they are not returned as
/// errors, the caller sees the final run object.
pub async fn execute_run(
    db: &DatabaseConnection,
    secrets: &SecretBox,
    project_id: Uuid,
    run_id: Uuid,
    actor_id: Uuid,
) -> AppResult<RunWithItems> {
    let run = runs::get(db, project_id, run_id).await?;
    if run.status != RunStatus::Approved {
        return Err(AppError::InvalidStatus(
            "run must be approved before execution".to_string(),
        ));
    }

    let mig = migrations::get(db, project_id, run.migration_id).await?;
    if mig.checksum_up != run.checksum_up_at_request
        || mig.checksum_down != run.checksum_down_at_request
    {
        return Err(AppError::ChecksumMismatch);
    }

    runs::mark_running(db, run_id, actor_id, Utc::now()).await?;

    let items = runs::list_items(db, run_id).await?;
    let mut first_error: Option<String> = None;

    for item in &items {
        if item.status != RunItemStatus::Queued {
            continue;
        }
        runs::update_item(
            db,
            item.id,
            RunItemStatus::Running,
            None,
            Some(Utc::now()),
            None,
        )
        .await?;

        match execute_item(db, secrets, &run, &mig, item, actor_id).await {
            Ok(ItemOutcome::Executed) => {
                runs::update_item(
                    db,
                    item.id,
                    RunItemStatus::Executed,
                    None,
                    None,
                    Some(Utc::now()),
                )
                .await?;
            }
            Ok(ItemOutcome::Skipped(message)) => {
                runs::update_item(
                    db,
                    item.id,
                    RunItemStatus::Skipped,
                    Some(message.to_string()),
                    None,
                    Some(Utc::now()),
                )
                .await?;
            }
            Err(err) => {
                let message = err.to_string();
                runs::update_item(
                    db,
                    item.id,
                    RunItemStatus::Failed,
                    Some(message.clone()),
                    None,
                    Some(Utc::now()),
                )
                .await?;
                first_error = Some(message);
                break;
            }
        }
    }

    let final_status = if first_error.is_some() {
        RunStatus::Failed
    } else {
        RunStatus::Executed
    };
    runs::finish(db, run_id, final_status, Utc::now()).await?;

    let result = runs::get_with_items(db, project_id, run_id).await?;

    match &first_error {
        None => {
            audit::record(
                db,
                Event {
                    actor_id: Some(actor_id),
                    action: "run_executed",
                    entity_type: "run",
                    entity_id: Some(run_id),
                    payload: json!({ "status": result.run.status }),
                },
            )
            .await;
        }
        Some(message) => {
            audit::record(
                db,
                Event {
                    actor_id: Some(actor_id),
                    action: "run_execute_failed",
                    entity_type: "run",
                    entity_id: Some(run_id),
                    payload: json!({ "error": message }),
                },
            )
            .await;
        }
    }

    Ok(result)
}

async fn execute_item(
    db: &DatabaseConnection,
    secrets: &SecretBox,
    run: &Run,
    mig: &Migration,
    item: &RunItem,
    actor_id: Uuid,
) -> AppResult<ItemOutcome> {
    let (target, password_enc) = db_targets::get_with_secret(db, item.db_target_id).await?;
    if !target.is_active {
        return Err(AppError::TargetDisabled);
    }

    let password_bytes = secrets.open(&password_enc)?;
    let password = String::from_utf8(password_bytes).map_err(|_| AppError::Crypto)?;

    let conn = TargetConnection::connect(&target, &password).await?;
    conn.acquire_lock(target.id).await?;

    let outcome = apply_on_target(&conn, run, mig, actor_id).await;

    conn.release_lock(target.id).await;
    conn.close().await;
    outcome
}

/// Reconcile against the bookkeeping table, then run the SQL body under the
/// migration's transaction mode. Called with the advisory lock held.
async fn apply_on_target(
    conn: &TargetConnection,
    run: &Run,
    mig: &Migration,
    actor_id: Uuid,
) -> AppResult<ItemOutcome> {
    conn.ensure_bookkeeping_table().await?;

    let recorded = conn.read_applied(&mig.key).await?;
    match run.run_type {
        RunType::Apply => match recorded.as_deref() {
            Some(checksum) if checksum == mig.checksum_up => {
                return Ok(ItemOutcome::Skipped("already applied, skipped"));
            }
            Some(_) => return Err(AppError::ChecksumConflictOnTarget),
            None => {}
        },
        // A rollback needs the row to exist with the expected checksum; the
        // row itself is kept so history stays reconstructible.
        RunType::Rollback => match recorded.as_deref() {
            Some(checksum) if checksum == mig.checksum_up => {}
            Some(_) => return Err(AppError::ChecksumConflictOnTarget),
            None => return Ok(ItemOutcome::Skipped("not applied, skipped")),
        },
    }

    let sql = match run.run_type {
        RunType::Apply => mig.sql_up.as_str(),
        RunType::Rollback => mig
            .sql_down
            .as_deref()
            .ok_or(AppError::MissingSqlDown)?,
    };

    let bookkeeping = AppliedRow {
        migration_key: &mig.key,
        checksum_up: &mig.checksum_up,
        checksum_down: mig.checksum_down.as_deref(),
        applied_by: actor_id.to_string(),
        tool_run_id: run.id.to_string(),
    };
    let record_apply = run.run_type == RunType::Apply;

    match mig.transaction_mode {
        TransactionMode::NoTransaction => {
            conn.exec_sql(conn.conn(), sql).await?;
            if record_apply {
                conn.insert_applied(conn.conn(), &bookkeeping).await?;
            }
        }
        TransactionMode::Auto | TransactionMode::SingleTransaction => {
            let txn = conn.begin().await?;
            let result = async {
                conn.exec_sql(&txn, sql).await?;
                if record_apply {
                    conn.insert_applied(&txn, &bookkeeping).await?;
                }
                Ok::<_, AppError>(())
            }
            .await;
            match result {
                Ok(()) => {
                    txn.commit()
                        .await
                        .map_err(|e| AppError::TargetError(format!("commit: {}", e)))?;
                }
                Err(err) => {
                    if let Err(rollback_err) = txn.rollback().await {
                        tracing::warn!(error = %rollback_err, "target transaction rollback failed");
                    }
                    return Err(err);
                }
            }
        }
    }

    Ok(ItemOutcome::Executed)
}
