//! Catalog store operations for projects.

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Project;

pub async fn create(db: &DatabaseConnection, name: &str) -> AppResult<Project> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("project name required".to_string()));
    }

    let id = Uuid::new_v4();
    let now = Utc::now();

    let model = crate::entity::project::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        created_at: Set(now),
    };

    crate::entity::project::Entity::insert(model)
        .exec(db)
        .await
        .map_err(|e| {
            if crate::db::is_unique_violation(&e) {
                AppError::Conflict("project name already exists".to_string())
            } else {
                e.into()
            }
        })?;

    Ok(Project {
        id,
        name: name.to_string(),
        created_at: now,
    })
}

pub async fn get(db: &DatabaseConnection, id: Uuid) -> AppResult<Project> {
    let model = crate::entity::project::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("project".to_string()))?;
    Ok(model_to_project(model))
}

pub async fn list(db: &DatabaseConnection) -> AppResult<Vec<Project>> {
    let models = crate::entity::project::Entity::find()
        .order_by_asc(crate::entity::project::Column::Name)
        .all(db)
        .await?;
    Ok(models.into_iter().map(model_to_project).collect())
}

fn model_to_project(m: crate::entity::project::Model) -> Project {
    Project {
        id: m.id,
        name: m.name,
        created_at: m.created_at,
    }
}
