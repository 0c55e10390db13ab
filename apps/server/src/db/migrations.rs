//! Catalog store operations for migrations and their approvals.

use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::Func;
use sea_orm::*;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    checksum, Approval, CreateMigrationInput, Decision, Env, Migration, TransactionMode,
    UpdateMigrationInput,
};

pub async fn create(
    db: &DatabaseConnection,
    project_id: Uuid,
    created_by: Uuid,
    input: CreateMigrationInput,
) -> AppResult<Migration> {
    let key = input.key.trim().to_string();
    if key.is_empty() {
        return Err(AppError::Validation("migration key required".to_string()));
    }
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("migration name required".to_string()));
    }
    if input.sql_up.trim().is_empty() {
        return Err(AppError::Validation("migration sql_up required".to_string()));
    }
    let mode = TransactionMode::parse(input.transaction_mode.as_deref().unwrap_or(""))
        .ok_or_else(|| AppError::Validation("invalid transaction_mode".to_string()))?;

    let sql_down = normalize_sql_down(input.sql_down);
    let checksum_up = checksum(&input.sql_up);
    let checksum_down = sql_down.as_deref().map(checksum);

    let id = Uuid::new_v4();
    let now = Utc::now();

    let model = crate::entity::migration::ActiveModel {
        id: Set(id),
        project_id: Set(project_id),
        migration_key: Set(key.clone()),
        name: Set(name.clone()),
        jira: Set(input.jira.clone()),
        description: Set(input.description.clone()),
        sql_up: Set(input.sql_up.clone()),
        sql_down: Set(sql_down.clone()),
        checksum_up: Set(checksum_up.clone()),
        checksum_down: Set(checksum_down.clone()),
        version: Set(1),
        transaction_mode: Set(mode.as_str().to_string()),
        created_by: Set(created_by),
        created_at: Set(now),
        updated_at: Set(now),
    };

    crate::entity::migration::Entity::insert(model)
        .exec(db)
        .await
        .map_err(|e| {
            if crate::db::is_unique_violation(&e) {
                AppError::Conflict("migration key already exists".to_string())
            } else {
                e.into()
            }
        })?;

    Ok(Migration {
        id,
        project_id,
        key,
        name,
        jira: input.jira,
        description: input.description,
        sql_up: input.sql_up,
        sql_down,
        checksum_up,
        checksum_down,
        version: 1,
        transaction_mode: mode,
        created_by,
        created_at: now,
        updated_at: now,
    })
}

/// Fetch a migration scoped to a project. A migration belonging to another
/// project is indistinguishable from a missing one.
pub async fn get(db: &DatabaseConnection, project_id: Uuid, id: Uuid) -> AppResult<Migration> {
    let model = crate::entity::migration::Entity::find_by_id(id)
        .filter(crate::entity::migration::Column::ProjectId.eq(project_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("migration".to_string()))?;
    model_to_migration(model)
}

pub async fn list(
    db: &DatabaseConnection,
    project_id: Uuid,
    search: Option<&str>,
) -> AppResult<Vec<Migration>> {
    let mut query = crate::entity::migration::Entity::find()
        .filter(crate::entity::migration::Column::ProjectId.eq(project_id));

    if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", term.to_lowercase());
        query = query.filter(
            Condition::any()
                .add(
                    Expr::expr(Func::lower(Expr::col(
                        crate::entity::migration::Column::MigrationKey,
                    )))
                    .like(pattern.clone()),
                )
                .add(
                    Expr::expr(Func::lower(Expr::col(crate::entity::migration::Column::Name)))
                        .like(pattern.clone()),
                )
                .add(
                    Expr::expr(Func::lower(Expr::col(crate::entity::migration::Column::Jira)))
                        .like(pattern),
                ),
        );
    }

    let models = query
        .order_by_desc(crate::entity::migration::Column::CreatedAt)
        .all(db)
        .await?;
    models.into_iter().map(model_to_migration).collect()
}

/// Apply a partial update. When the SQL changed (sql_up differs, sql_down
/// flips presence, or sql_down differs) the checksums are recomputed, the
/// version is bumped, and every approval for this migration is deleted, all
/// in one transaction. Returns the updated migration and whether SQL changed
/// so callers can emit the invalidation audit event.
pub async fn update(
    db: &DatabaseConnection,
    project_id: Uuid,
    id: Uuid,
    input: UpdateMigrationInput,
) -> AppResult<(Migration, bool)> {
    let current = get(db, project_id, id).await?;

    let name = input.name.unwrap_or_else(|| current.name.clone());
    if name.trim().is_empty() {
        return Err(AppError::Validation("migration name required".to_string()));
    }
    let jira = match input.jira {
        Some(j) => Some(j),
        None => current.jira.clone(),
    };
    let description = match input.description {
        Some(d) => Some(d),
        None => current.description.clone(),
    };
    let sql_up = input.sql_up.unwrap_or_else(|| current.sql_up.clone());
    if sql_up.trim().is_empty() {
        return Err(AppError::Validation("migration sql_up required".to_string()));
    }
    // `sql_down: Some("")` clears the rollback SQL; None keeps the current one.
    let sql_down = match input.sql_down {
        Some(down) => normalize_sql_down(Some(down)),
        None => current.sql_down.clone(),
    };
    let mode = match input.transaction_mode {
        Some(m) => TransactionMode::parse(&m)
            .ok_or_else(|| AppError::Validation("invalid transaction_mode".to_string()))?,
        None => current.transaction_mode,
    };

    let sql_changed = sql_up != current.sql_up
        || sql_down.is_some() != current.sql_down.is_some()
        || sql_down != current.sql_down;

    let (version, checksum_up, checksum_down) = if sql_changed {
        (
            current.version + 1,
            checksum(&sql_up),
            sql_down.as_deref().map(checksum),
        )
    } else {
        (
            current.version,
            current.checksum_up.clone(),
            current.checksum_down.clone(),
        )
    };

    let now = Utc::now();
    let txn = db.begin().await?;

    let mut active: crate::entity::migration::ActiveModel =
        crate::entity::migration::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("migration".to_string()))?
            .into();
    active.name = Set(name.trim().to_string());
    active.jira = Set(jira.clone());
    active.description = Set(description.clone());
    active.sql_up = Set(sql_up.clone());
    active.sql_down = Set(sql_down.clone());
    active.checksum_up = Set(checksum_up.clone());
    active.checksum_down = Set(checksum_down.clone());
    active.version = Set(version);
    active.transaction_mode = Set(mode.as_str().to_string());
    active.updated_at = Set(now);
    active.update(&txn).await?;

    if sql_changed {
        crate::entity::approval::Entity::delete_many()
            .filter(crate::entity::approval::Column::MigrationId.eq(id))
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;

    let updated = Migration {
        id,
        project_id,
        key: current.key,
        name: name.trim().to_string(),
        jira,
        description,
        sql_up,
        sql_down,
        checksum_up,
        checksum_down,
        version,
        transaction_mode: mode,
        created_by: current.created_by,
        created_at: current.created_at,
        updated_at: now,
    };

    Ok((updated, sql_changed))
}

pub async fn list_approvals(db: &DatabaseConnection, migration_id: Uuid) -> AppResult<Vec<Approval>> {
    let models = crate::entity::approval::Entity::find()
        .filter(crate::entity::approval::Column::MigrationId.eq(migration_id))
        .order_by_desc(crate::entity::approval::Column::DecidedAt)
        .all(db)
        .await?;
    models.into_iter().map(model_to_approval).collect()
}

fn normalize_sql_down(sql_down: Option<String>) -> Option<String> {
    sql_down.filter(|s| !s.trim().is_empty())
}

fn model_to_migration(m: crate::entity::migration::Model) -> AppResult<Migration> {
    let transaction_mode = TransactionMode::parse(&m.transaction_mode).ok_or_else(|| {
        AppError::Database(format!(
            "unknown transaction_mode in catalog: {}",
            m.transaction_mode
        ))
    })?;
    Ok(Migration {
        id: m.id,
        project_id: m.project_id,
        key: m.migration_key,
        name: m.name,
        jira: m.jira,
        description: m.description,
        sql_up: m.sql_up,
        sql_down: m.sql_down,
        checksum_up: m.checksum_up,
        checksum_down: m.checksum_down,
        version: m.version,
        transaction_mode,
        created_by: m.created_by,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn model_to_approval(m: crate::entity::approval::Model) -> AppResult<Approval> {
    let env = Env::parse(&m.env)
        .ok_or_else(|| AppError::Database(format!("unknown env in catalog: {}", m.env)))?;
    let decision = Decision::parse(&m.decision)
        .ok_or_else(|| AppError::Database(format!("unknown decision in catalog: {}", m.decision)))?;
    Ok(Approval {
        id: m.id,
        migration_id: m.migration_id,
        env,
        decision,
        comment: m.comment,
        decided_by: m.decided_by,
        decided_at: m.decided_at,
        checksum_up_at_decision: m.checksum_up_at_decision,
        checksum_down_at_decision: m.checksum_down_at_decision,
    })
}
