//! Catalog store operations for db-targets.
//!
//! Passwords are sealed before they reach the catalog and only ever leave it
//! as ciphertext; decryption happens inside the executor at the moment of use.

use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::*;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{CreateTargetInput, DbTarget, Engine, UpdateTargetInput};
use crate::secret::SecretBox;

pub async fn create(
    db: &DatabaseConnection,
    secrets: &SecretBox,
    input: CreateTargetInput,
) -> AppResult<DbTarget> {
    let engine = Engine::parse(&input.engine)
        .ok_or_else(|| AppError::Validation("invalid engine".to_string()))?;
    if input.port <= 0 {
        return Err(AppError::Validation("port must be positive".to_string()));
    }
    let host = input.host.trim();
    let dbname = input.dbname.trim();
    let username = input.username.trim();
    if host.is_empty() || dbname.is_empty() || username.is_empty() {
        return Err(AppError::Validation(
            "host, dbname, username required".to_string(),
        ));
    }

    let password_enc = secrets.seal(input.password.as_bytes())?;
    let options = input.options.unwrap_or_else(|| JsonValue::Object(Default::default()));

    let id = Uuid::new_v4();
    let now = Utc::now();

    let model = crate::entity::db_target::ActiveModel {
        id: Set(id),
        db_set_id: Set(input.db_set_id),
        engine: Set(engine.as_str().to_string()),
        host: Set(host.to_string()),
        port: Set(input.port),
        dbname: Set(dbname.to_string()),
        username: Set(username.to_string()),
        password_enc: Set(password_enc),
        options: Set(options.clone()),
        is_active: Set(true),
        created_at: Set(now),
    };

    crate::entity::db_target::Entity::insert(model)
        .exec(db)
        .await?;

    Ok(DbTarget {
        id,
        db_set_id: input.db_set_id,
        engine,
        host: host.to_string(),
        port: input.port as u16,
        dbname: dbname.to_string(),
        username: username.to_string(),
        options,
        is_active: true,
        created_at: now,
    })
}

pub async fn get(db: &DatabaseConnection, id: Uuid) -> AppResult<DbTarget> {
    let (target, _) = get_with_secret(db, id).await?;
    Ok(target)
}

/// Fetch a target together with its sealed password. Only the executor and
/// the connection probe should need the ciphertext.
pub async fn get_with_secret(
    db: &DatabaseConnection,
    id: Uuid,
) -> AppResult<(DbTarget, Vec<u8>)> {
    let model = crate::entity::db_target::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("db target".to_string()))?;
    let password_enc = model.password_enc.clone();
    Ok((model_to_target(model)?, password_enc))
}

pub async fn list_by_set(db: &DatabaseConnection, db_set_id: Uuid) -> AppResult<Vec<DbTarget>> {
    let models = crate::entity::db_target::Entity::find()
        .filter(crate::entity::db_target::Column::DbSetId.eq(db_set_id))
        .order_by_asc(crate::entity::db_target::Column::CreatedAt)
        .all(db)
        .await?;
    models.into_iter().map(model_to_target).collect()
}

pub async fn update(
    db: &DatabaseConnection,
    secrets: &SecretBox,
    id: Uuid,
    input: UpdateTargetInput,
) -> AppResult<DbTarget> {
    let model = crate::entity::db_target::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("db target".to_string()))?;

    let mut active: crate::entity::db_target::ActiveModel = model.into();

    if let Some(host) = input.host.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        active.host = Set(host.to_string());
    }
    if let Some(port) = input.port.filter(|p| *p > 0) {
        active.port = Set(port);
    }
    if let Some(dbname) = input
        .dbname
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        active.dbname = Set(dbname.to_string());
    }
    if let Some(username) = input
        .username
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        active.username = Set(username.to_string());
    }
    if let Some(password) = input.password.as_deref().filter(|s| !s.trim().is_empty()) {
        active.password_enc = Set(secrets.seal(password.as_bytes())?);
    }
    if let Some(options) = input.options {
        active.options = Set(options);
    }

    let updated = active.update(db).await?;
    model_to_target(updated)
}

pub async fn disable(db: &DatabaseConnection, id: Uuid) -> AppResult<()> {
    let result = crate::entity::db_target::Entity::update_many()
        .col_expr(
            crate::entity::db_target::Column::IsActive,
            Expr::value(false),
        )
        .filter(crate::entity::db_target::Column::Id.eq(id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("db target".to_string()));
    }
    Ok(())
}

fn model_to_target(m: crate::entity::db_target::Model) -> AppResult<DbTarget> {
    let engine = Engine::parse(&m.engine)
        .ok_or_else(|| AppError::Database(format!("unknown engine in catalog: {}", m.engine)))?;
    Ok(DbTarget {
        id: m.id,
        db_set_id: m.db_set_id,
        engine,
        host: m.host,
        port: m.port as u16,
        dbname: m.dbname,
        username: m.username,
        options: m.options,
        is_active: m.is_active,
        created_at: m.created_at,
    })
}
