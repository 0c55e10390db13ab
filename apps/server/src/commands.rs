//! Command surface: one entry point per user-observable operation.
//!
//! Thin by design: each command enforces its role gate and project scoping,
//! then dispatches to the store or a service. No business logic lives here.

use uuid::Uuid;

use crate::context::AppContext;
use crate::db::{db_sets, db_targets, migrations, projects, runs, users};
use crate::error::{AppError, AppResult};
use crate::models::{
    Approval, AuditEvent, CreateMigrationInput, CreateTargetInput, CreateUserInput, DbSet,
    DbTarget, DecideRunInput, Env, Migration, Project, RequestRunInput, Role, Run, RunWithItems,
    UpdateMigrationInput, UpdateTargetInput, UpdateUserInput, User,
};
use crate::services::{accounts, executor, inventory, migrations as migration_service, runs as run_service};

/// The authenticated actor a transport hands to every command.
#[derive(Debug, Clone)]
pub struct ActorContext {
    pub user_id: Uuid,
    pub role: Role,
    /// Currently selected project; project-scoped commands require it.
    pub project_id: Option<Uuid>,
}

impl ActorContext {
    fn require_role(&self, allowed: &[Role]) -> AppResult<()> {
        if self.role.allows(allowed) {
            Ok(())
        } else {
            Err(AppError::Forbidden("insufficient role".to_string()))
        }
    }

    fn require_project(&self) -> AppResult<Uuid> {
        self.project_id
            .ok_or_else(|| AppError::Forbidden("no project selected".to_string()))
    }
}

const ANY_ROLE: &[Role] = &[Role::User, Role::Manager, Role::Admin];
const MANAGERS: &[Role] = &[Role::Manager, Role::Admin];
const ADMINS: &[Role] = &[Role::Admin];

// Projects

pub async fn create_project(
    ctx: &AppContext,
    actor: &ActorContext,
    name: &str,
) -> AppResult<Project> {
    actor.require_role(ADMINS)?;
    accounts::create_project(ctx.db.connection(), actor.user_id, name).await
}

pub async fn list_projects(ctx: &AppContext, actor: &ActorContext) -> AppResult<Vec<Project>> {
    actor.require_role(ANY_ROLE)?;
    projects::list(ctx.db.connection()).await
}

pub async fn get_project(
    ctx: &AppContext,
    actor: &ActorContext,
    project_id: Uuid,
) -> AppResult<Project> {
    actor.require_role(ANY_ROLE)?;
    projects::get(ctx.db.connection(), project_id).await
}

// Users

pub async fn create_user(
    ctx: &AppContext,
    actor: &ActorContext,
    input: CreateUserInput,
) -> AppResult<User> {
    actor.require_role(ADMINS)?;
    accounts::create_user(ctx.db.connection(), actor.user_id, input).await
}

pub async fn update_user(
    ctx: &AppContext,
    actor: &ActorContext,
    user_id: Uuid,
    input: UpdateUserInput,
) -> AppResult<User> {
    actor.require_role(ADMINS)?;
    accounts::update_user(ctx.db.connection(), actor.user_id, user_id, input).await
}

pub async fn disable_user(
    ctx: &AppContext,
    actor: &ActorContext,
    user_id: Uuid,
) -> AppResult<()> {
    actor.require_role(ADMINS)?;
    accounts::disable_user(ctx.db.connection(), actor.user_id, user_id).await
}

pub async fn list_users(ctx: &AppContext, actor: &ActorContext) -> AppResult<Vec<User>> {
    actor.require_role(ADMINS)?;
    users::list(ctx.db.connection()).await
}

// DB inventory

pub async fn create_db_set(
    ctx: &AppContext,
    actor: &ActorContext,
    env: &str,
    name: &str,
) -> AppResult<DbSet> {
    actor.require_role(ANY_ROLE)?;
    let project_id = actor.require_project()?;
    inventory::create_db_set(ctx.db.connection(), actor.user_id, project_id, env, name).await
}

pub async fn list_db_sets(
    ctx: &AppContext,
    actor: &ActorContext,
    env_filter: Option<Env>,
) -> AppResult<Vec<DbSet>> {
    actor.require_role(ANY_ROLE)?;
    let project_id = actor.require_project()?;
    db_sets::list(ctx.db.connection(), project_id, env_filter).await
}

pub async fn disable_db_set(
    ctx: &AppContext,
    actor: &ActorContext,
    db_set_id: Uuid,
) -> AppResult<()> {
    actor.require_role(ADMINS)?;
    let project_id = actor.require_project()?;
    scoped_db_set(ctx, project_id, db_set_id).await?;
    inventory::disable_db_set(ctx.db.connection(), actor.user_id, db_set_id).await
}

pub async fn create_db_target(
    ctx: &AppContext,
    actor: &ActorContext,
    input: CreateTargetInput,
) -> AppResult<DbTarget> {
    actor.require_role(ANY_ROLE)?;
    let project_id = actor.require_project()?;
    scoped_db_set(ctx, project_id, input.db_set_id).await?;
    inventory::create_db_target(ctx.db.connection(), &ctx.secrets, actor.user_id, input).await
}

pub async fn list_db_targets(
    ctx: &AppContext,
    actor: &ActorContext,
    db_set_id: Uuid,
) -> AppResult<Vec<DbTarget>> {
    actor.require_role(ANY_ROLE)?;
    let project_id = actor.require_project()?;
    scoped_db_set(ctx, project_id, db_set_id).await?;
    db_targets::list_by_set(ctx.db.connection(), db_set_id).await
}

pub async fn update_db_target(
    ctx: &AppContext,
    actor: &ActorContext,
    target_id: Uuid,
    input: UpdateTargetInput,
) -> AppResult<DbTarget> {
    actor.require_role(ANY_ROLE)?;
    let project_id = actor.require_project()?;
    scoped_db_target(ctx, project_id, target_id).await?;
    inventory::update_db_target(ctx.db.connection(), &ctx.secrets, actor.user_id, target_id, input)
        .await
}

pub async fn disable_db_target(
    ctx: &AppContext,
    actor: &ActorContext,
    target_id: Uuid,
) -> AppResult<()> {
    actor.require_role(ADMINS)?;
    let project_id = actor.require_project()?;
    scoped_db_target(ctx, project_id, target_id).await?;
    inventory::disable_db_target(ctx.db.connection(), actor.user_id, target_id).await
}

pub async fn test_target_connection(
    ctx: &AppContext,
    actor: &ActorContext,
    target_id: Uuid,
) -> AppResult<()> {
    actor.require_role(ANY_ROLE)?;
    let project_id = actor.require_project()?;
    scoped_db_target(ctx, project_id, target_id).await?;
    inventory::test_target_connection(ctx.db.connection(), &ctx.secrets, actor.user_id, target_id)
        .await
}

// Migrations

pub async fn create_migration(
    ctx: &AppContext,
    actor: &ActorContext,
    input: CreateMigrationInput,
) -> AppResult<Migration> {
    actor.require_role(ANY_ROLE)?;
    let project_id = actor.require_project()?;
    migration_service::create(ctx.db.connection(), project_id, actor.user_id, input).await
}

pub async fn update_migration(
    ctx: &AppContext,
    actor: &ActorContext,
    migration_id: Uuid,
    input: UpdateMigrationInput,
) -> AppResult<Migration> {
    actor.require_role(ANY_ROLE)?;
    let project_id = actor.require_project()?;
    migration_service::update(ctx.db.connection(), project_id, actor.user_id, migration_id, input)
        .await
}

pub async fn get_migration(
    ctx: &AppContext,
    actor: &ActorContext,
    migration_id: Uuid,
) -> AppResult<Migration> {
    actor.require_role(ANY_ROLE)?;
    let project_id = actor.require_project()?;
    migrations::get(ctx.db.connection(), project_id, migration_id).await
}

pub async fn list_migrations(
    ctx: &AppContext,
    actor: &ActorContext,
    search: Option<&str>,
) -> AppResult<Vec<Migration>> {
    actor.require_role(ANY_ROLE)?;
    let project_id = actor.require_project()?;
    migrations::list(ctx.db.connection(), project_id, search).await
}

pub async fn list_approvals(
    ctx: &AppContext,
    actor: &ActorContext,
    migration_id: Uuid,
) -> AppResult<Vec<Approval>> {
    actor.require_role(ANY_ROLE)?;
    let project_id = actor.require_project()?;
    // Scope check: the migration must belong to the selected project.
    migrations::get(ctx.db.connection(), project_id, migration_id).await?;
    migrations::list_approvals(ctx.db.connection(), migration_id).await
}

// Runs

pub async fn request_run(
    ctx: &AppContext,
    actor: &ActorContext,
    input: RequestRunInput,
) -> AppResult<RunWithItems> {
    actor.require_role(ANY_ROLE)?;
    let project_id = actor.require_project()?;
    run_service::request(
        ctx.db.connection(),
        runs::RequestRun {
            project_id,
            migration_id: input.migration_id,
            db_set_id: input.db_set_id,
            env: input.env,
            run_type: input.run_type,
            requested_by: actor.user_id,
        },
    )
    .await
}

pub async fn decide_run(
    ctx: &AppContext,
    actor: &ActorContext,
    run_id: Uuid,
    input: DecideRunInput,
) -> AppResult<Run> {
    actor.require_role(MANAGERS)?;
    let project_id = actor.require_project()?;
    run_service::decide(
        ctx.db.connection(),
        runs::DecideRun {
            project_id,
            run_id,
            actor_id: actor.user_id,
            decision: input.decision,
            comment: input.comment,
        },
    )
    .await
}

pub async fn execute_run(
    ctx: &AppContext,
    actor: &ActorContext,
    run_id: Uuid,
) -> AppResult<RunWithItems> {
    actor.require_role(ANY_ROLE)?;
    let project_id = actor.require_project()?;
    executor::execute_run(
        ctx.db.connection(),
        &ctx.secrets,
        project_id,
        run_id,
        actor.user_id,
    )
    .await
}

pub async fn get_run(
    ctx: &AppContext,
    actor: &ActorContext,
    run_id: Uuid,
) -> AppResult<RunWithItems> {
    actor.require_role(ANY_ROLE)?;
    let project_id = actor.require_project()?;
    runs::get_with_items(ctx.db.connection(), project_id, run_id).await
}

pub async fn list_runs_for_migration(
    ctx: &AppContext,
    actor: &ActorContext,
    migration_id: Uuid,
) -> AppResult<Vec<Run>> {
    actor.require_role(ANY_ROLE)?;
    let project_id = actor.require_project()?;
    runs::list_for_migration(ctx.db.connection(), project_id, migration_id).await
}

// Audit

pub async fn list_audit_events(
    ctx: &AppContext,
    actor: &ActorContext,
    limit: Option<u64>,
) -> AppResult<Vec<AuditEvent>> {
    actor.require_role(ADMINS)?;
    crate::db::audit_events::list_recent(ctx.db.connection(), limit.unwrap_or(100).min(1000)).await
}

/// A db-set outside the selected project is indistinguishable from a missing
/// one.
async fn scoped_db_set(ctx: &AppContext, project_id: Uuid, db_set_id: Uuid) -> AppResult<DbSet> {
    let set = db_sets::get(ctx.db.connection(), db_set_id).await?;
    if set.project_id != project_id {
        return Err(AppError::NotFound("db set".to_string()));
    }
    Ok(set)
}

async fn scoped_db_target(
    ctx: &AppContext,
    project_id: Uuid,
    target_id: Uuid,
) -> AppResult<DbTarget> {
    let target = db_targets::get(ctx.db.connection(), target_id).await?;
    scoped_db_set(ctx, project_id, target.db_set_id).await?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role, project: bool) -> ActorContext {
        ActorContext {
            user_id: Uuid::new_v4(),
            role,
            project_id: project.then(Uuid::new_v4),
        }
    }

    #[test]
    fn test_role_gates() {
        assert!(actor(Role::User, true).require_role(ANY_ROLE).is_ok());
        assert!(actor(Role::User, true).require_role(MANAGERS).is_err());
        assert!(actor(Role::Manager, true).require_role(MANAGERS).is_ok());
        assert!(actor(Role::Manager, true).require_role(ADMINS).is_err());
        assert!(actor(Role::Admin, true).require_role(ADMINS).is_ok());
    }

    #[test]
    fn test_role_gate_error_is_forbidden() {
        let err = actor(Role::User, true).require_role(ADMINS).unwrap_err();
        assert_eq!(err.code(), "forbidden");
    }

    #[test]
    fn test_project_scope_required() {
        assert!(actor(Role::Admin, true).require_project().is_ok());
        let err = actor(Role::Admin, false).require_project().unwrap_err();
        assert_eq!(err.code(), "forbidden");
    }
}
