//! Catalog store operations for db-sets.

use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::*;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{DbSet, Env};

pub async fn create(
    db: &DatabaseConnection,
    project_id: Uuid,
    env: &str,
    name: &str,
    created_by: Uuid,
) -> AppResult<DbSet> {
    let env = Env::parse(env).ok_or_else(|| AppError::Validation("invalid env".to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("db set name required".to_string()));
    }

    let id = Uuid::new_v4();
    let now = Utc::now();

    let model = crate::entity::db_set::ActiveModel {
        id: Set(id),
        project_id: Set(project_id),
        env: Set(env.as_str().to_string()),
        name: Set(name.to_string()),
        is_active: Set(true),
        created_by: Set(created_by),
        created_at: Set(now),
    };

    crate::entity::db_set::Entity::insert(model)
        .exec(db)
        .await
        .map_err(|e| {
            if crate::db::is_unique_violation(&e) {
                AppError::Conflict("db set name already exists for project/env".to_string())
            } else {
                e.into()
            }
        })?;

    Ok(DbSet {
        id,
        project_id,
        env,
        name: name.to_string(),
        is_active: true,
        created_by,
        created_at: now,
    })
}

pub async fn get(db: &DatabaseConnection, id: Uuid) -> AppResult<DbSet> {
    let model = crate::entity::db_set::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("db set".to_string()))?;
    model_to_db_set(model)
}

pub async fn list(
    db: &DatabaseConnection,
    project_id: Uuid,
    env_filter: Option<Env>,
) -> AppResult<Vec<DbSet>> {
    let mut query = crate::entity::db_set::Entity::find()
        .filter(crate::entity::db_set::Column::ProjectId.eq(project_id));
    if let Some(env) = env_filter {
        query = query.filter(crate::entity::db_set::Column::Env.eq(env.as_str()));
    }
    let models = query
        .order_by_asc(crate::entity::db_set::Column::Name)
        .all(db)
        .await?;
    models.into_iter().map(model_to_db_set).collect()
}

pub async fn disable(db: &DatabaseConnection, id: Uuid) -> AppResult<()> {
    let result = crate::entity::db_set::Entity::update_many()
        .col_expr(crate::entity::db_set::Column::IsActive, Expr::value(false))
        .filter(crate::entity::db_set::Column::Id.eq(id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("db set".to_string()));
    }
    Ok(())
}

fn model_to_db_set(m: crate::entity::db_set::Model) -> AppResult<DbSet> {
    let env = Env::parse(&m.env)
        .ok_or_else(|| AppError::Database(format!("unknown env in catalog: {}", m.env)))?;
    Ok(DbSet {
        id: m.id,
        project_id: m.project_id,
        env,
        name: m.name,
        is_active: m.is_active,
        created_by: m.created_by,
        created_at: m.created_at,
    })
}
