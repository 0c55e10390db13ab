//! Integration tests for the catalog store, run coordinator, and the
//! execution engine's catalog-side behavior.
//!
//! The catalog schema builds on SQLite, so the whole stack below the target
//! connector runs against an in-memory database. Target-touching paths are
//! covered by `target_execution_tests.rs` against live databases.

use migrate_hub_server::db::{audit_events, db_sets, db_targets, migrations, projects, runs, users};
use migrate_hub_server::error::AppError;
use migrate_hub_server::migration::Migrator;
use migrate_hub_server::models::{
    CreateMigrationInput, CreateTargetInput, CreateUserInput, DbSet, DbTarget, Decision, Migration,
    Project, Role, RunItemStatus, RunStatus, RunType, UpdateMigrationInput, UpdateUserInput, User,
};
use migrate_hub_server::secret::SecretBox;
use migrate_hub_server::services::executor;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

const SQL_UP: &str = "CREATE TABLE t(id int);";
const SQL_UP_CHECKSUM: &str = "c2547c631a5aa8c92a00d05232f70aef43987b41b745d8ba65bd16496c228761";
const SQL_DOWN: &str = "DROP TABLE t;";

async fn setup() -> DatabaseConnection {
    // A single pinned connection: pooled `sqlite::memory:` connections each
    // get their own database.
    let mut opt = sea_orm::ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt)
        .await
        .expect("sqlite in-memory catalog");
    Migrator::up(&db, None).await.expect("catalog migrations");
    db
}

fn secrets() -> SecretBox {
    SecretBox::new([1u8; 32])
}

struct Fixture {
    db: DatabaseConnection,
    secrets: SecretBox,
    project: Project,
    requester: User,
    manager: User,
    set: DbSet,
    target: DbTarget,
    migration: Migration,
}

/// Project P1 with one stg db-set, one (unreachable) postgres target, a
/// requester and a manager, and one migration with up+down SQL.
async fn fixture() -> Fixture {
    let db = setup().await;
    let secrets = secrets();

    let project = projects::create(&db, "P1").await.unwrap();
    let requester = users::create(
        &db,
        CreateUserInput {
            email: "u1@example.com".into(),
            name: "u1".into(),
            role: Some(Role::User),
        },
    )
    .await
    .unwrap();
    let manager = users::create(
        &db,
        CreateUserInput {
            email: "u2@example.com".into(),
            name: "u2".into(),
            role: Some(Role::Manager),
        },
    )
    .await
    .unwrap();

    let set = db_sets::create(&db, project.id, "stg", "s", requester.id)
        .await
        .unwrap();
    let target = db_targets::create(
        &db,
        &secrets,
        CreateTargetInput {
            db_set_id: set.id,
            engine: "postgres".into(),
            host: "127.0.0.1".into(),
            // Discard port: connections fail fast, which is what the
            // catalog-side tests want.
            port: 9,
            dbname: "app".into(),
            username: "migrator".into(),
            password: "pw".into(),
            options: None,
        },
    )
    .await
    .unwrap();

    let migration = migrations::create(
        &db,
        project.id,
        requester.id,
        CreateMigrationInput {
            key: "20250101_001_t".into(),
            name: "create t".into(),
            jira: None,
            description: None,
            sql_up: SQL_UP.into(),
            sql_down: Some(SQL_DOWN.into()),
            transaction_mode: Some("auto".into()),
        },
    )
    .await
    .unwrap();

    Fixture {
        db,
        secrets,
        project,
        requester,
        manager,
        set,
        target,
        migration,
    }
}

fn request_input(fx: &Fixture, run_type: &str) -> runs::RequestRun {
    runs::RequestRun {
        project_id: fx.project.id,
        migration_id: fx.migration.id,
        db_set_id: fx.set.id,
        env: "stg".into(),
        run_type: Some(run_type.into()),
        requested_by: fx.requester.id,
    }
}

fn decide_input(fx: &Fixture, run_id: uuid::Uuid, decision: Decision) -> runs::DecideRun {
    runs::DecideRun {
        project_id: fx.project.id,
        run_id,
        actor_id: fx.manager.id,
        decision,
        comment: Some("ok".into()),
    }
}

// Migrations

#[tokio::test]
async fn create_migration_computes_checksums() {
    let fx = fixture().await;
    assert_eq!(fx.migration.version, 1);
    assert_eq!(fx.migration.checksum_up, SQL_UP_CHECKSUM);
    assert!(fx.migration.checksum_down.is_some());
    assert_eq!(
        fx.migration.checksum_down.as_deref().unwrap(),
        migrate_hub_server::models::checksum(SQL_DOWN)
    );
}

#[tokio::test]
async fn create_migration_rejects_bad_input() {
    let fx = fixture().await;

    let empty_sql = migrations::create(
        &fx.db,
        fx.project.id,
        fx.requester.id,
        CreateMigrationInput {
            key: "k1".into(),
            name: "n".into(),
            jira: None,
            description: None,
            sql_up: "   ".into(),
            sql_down: None,
            transaction_mode: None,
        },
    )
    .await;
    assert_eq!(empty_sql.unwrap_err().code(), "validation_error");

    let bad_mode = migrations::create(
        &fx.db,
        fx.project.id,
        fx.requester.id,
        CreateMigrationInput {
            key: "k2".into(),
            name: "n".into(),
            jira: None,
            description: None,
            sql_up: "SELECT 1;".into(),
            sql_down: None,
            transaction_mode: Some("two_phase".into()),
        },
    )
    .await;
    assert_eq!(bad_mode.unwrap_err().code(), "validation_error");

    let empty_key = migrations::create(
        &fx.db,
        fx.project.id,
        fx.requester.id,
        CreateMigrationInput {
            key: "  ".into(),
            name: "n".into(),
            jira: None,
            description: None,
            sql_up: "SELECT 1;".into(),
            sql_down: None,
            transaction_mode: None,
        },
    )
    .await;
    assert_eq!(empty_key.unwrap_err().code(), "validation_error");
}

#[tokio::test]
async fn duplicate_migration_key_is_conflict() {
    let fx = fixture().await;
    let dup = migrations::create(
        &fx.db,
        fx.project.id,
        fx.requester.id,
        CreateMigrationInput {
            key: fx.migration.key.clone(),
            name: "again".into(),
            jira: None,
            description: None,
            sql_up: "SELECT 1;".into(),
            sql_down: None,
            transaction_mode: None,
        },
    )
    .await;
    assert_eq!(dup.unwrap_err().code(), "conflict");
}

#[tokio::test]
async fn migration_is_scoped_to_its_project() {
    let fx = fixture().await;
    let other = projects::create(&fx.db, "P2").await.unwrap();
    let err = migrations::get(&fx.db, other.id, fx.migration.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "not_found");
}

#[tokio::test]
async fn update_without_sql_change_keeps_version_and_approvals() {
    let fx = fixture().await;
    let run = runs::request(&fx.db, request_input(&fx, "apply")).await.unwrap();
    runs::decide(&fx.db, decide_input(&fx, run.run.id, Decision::Approved))
        .await
        .unwrap();

    let (updated, sql_changed) = migrations::update(
        &fx.db,
        fx.project.id,
        fx.migration.id,
        UpdateMigrationInput {
            name: Some("renamed".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(!sql_changed);
    assert_eq!(updated.version, 1);
    assert_eq!(updated.checksum_up, SQL_UP_CHECKSUM);
    let approvals = migrations::list_approvals(&fx.db, fx.migration.id)
        .await
        .unwrap();
    assert_eq!(approvals.len(), 1);
}

#[tokio::test]
async fn sql_change_bumps_version_and_deletes_approvals() {
    let fx = fixture().await;
    let run = runs::request(&fx.db, request_input(&fx, "apply")).await.unwrap();
    runs::decide(&fx.db, decide_input(&fx, run.run.id, Decision::Approved))
        .await
        .unwrap();

    let (updated, sql_changed) = migrations::update(
        &fx.db,
        fx.project.id,
        fx.migration.id,
        UpdateMigrationInput {
            sql_up: Some("CREATE TABLE t(id bigint);".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(sql_changed);
    assert_eq!(updated.version, 2);
    assert_eq!(
        updated.checksum_up,
        "433be6c3611c2cdb4a3501fce1d56e73ccbf9b26c4e2134270998e333343876a"
    );
    assert!(
        migrations::list_approvals(&fx.db, fx.migration.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn clearing_sql_down_counts_as_sql_change() {
    let fx = fixture().await;
    let (updated, sql_changed) = migrations::update(
        &fx.db,
        fx.project.id,
        fx.migration.id,
        UpdateMigrationInput {
            sql_down: Some("".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(sql_changed);
    assert_eq!(updated.version, 2);
    assert!(updated.sql_down.is_none());
    assert!(updated.checksum_down.is_none());
}

// Run requests

#[tokio::test]
async fn request_run_snapshots_checksums_and_creates_items() {
    let fx = fixture().await;
    let run = runs::request(&fx.db, request_input(&fx, "apply")).await.unwrap();

    assert_eq!(run.run.status, RunStatus::AwaitingApproval);
    assert_eq!(run.run.run_type, RunType::Apply);
    assert_eq!(run.run.checksum_up_at_request, SQL_UP_CHECKSUM);
    assert_eq!(
        run.run.checksum_down_at_request,
        fx.migration.checksum_down
    );
    assert_eq!(run.items.len(), 1);
    assert_eq!(run.items[0].status, RunItemStatus::Queued);
    assert_eq!(run.items[0].db_target_id, fx.target.id);

    let fetched = runs::get_with_items(&fx.db, fx.project.id, run.run.id)
        .await
        .unwrap();
    assert_eq!(fetched.items.len(), 1);
}

#[tokio::test]
async fn request_run_rejects_zero_active_targets() {
    let fx = fixture().await;
    db_targets::disable(&fx.db, fx.target.id).await.unwrap();

    let err = runs::request(&fx.db, request_input(&fx, "apply"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NoActiveTargets));
}

#[tokio::test]
async fn rollback_request_requires_sql_down() {
    let fx = fixture().await;
    let no_down = migrations::create(
        &fx.db,
        fx.project.id,
        fx.requester.id,
        CreateMigrationInput {
            key: "20250101_002_up_only".into(),
            name: "up only".into(),
            jira: None,
            description: None,
            sql_up: "SELECT 1;".into(),
            sql_down: None,
            transaction_mode: None,
        },
    )
    .await
    .unwrap();

    let err = runs::request(
        &fx.db,
        runs::RequestRun {
            migration_id: no_down.id,
            ..request_input(&fx, "rollback")
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::MissingSqlDown));
}

#[tokio::test]
async fn request_run_validates_env() {
    let fx = fixture().await;

    let unknown_env = runs::request(
        &fx.db,
        runs::RequestRun {
            env: "production".into(),
            ..request_input(&fx, "apply")
        },
    )
    .await
    .unwrap_err();
    assert_eq!(unknown_env.code(), "validation_error");

    // Valid env, but not the db-set's env.
    let mismatch = runs::request(
        &fx.db,
        runs::RequestRun {
            env: "prd".into(),
            ..request_input(&fx, "apply")
        },
    )
    .await
    .unwrap_err();
    assert_eq!(mismatch.code(), "validation_error");
}

#[tokio::test]
async fn request_run_rejects_unknown_run_type() {
    let fx = fixture().await;
    let err = runs::request(
        &fx.db,
        runs::RequestRun {
            run_type: Some("undo".into()),
            ..request_input(&fx, "apply")
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "validation_error");
}

// Decisions

#[tokio::test]
async fn approval_binds_request_checksums() {
    let fx = fixture().await;
    let run = runs::request(&fx.db, request_input(&fx, "apply")).await.unwrap();

    let decided = runs::decide(&fx.db, decide_input(&fx, run.run.id, Decision::Approved))
        .await
        .unwrap();
    assert_eq!(decided.status, RunStatus::Approved);
    assert_eq!(decided.approved_by, Some(fx.manager.id));

    let approvals = migrations::list_approvals(&fx.db, fx.migration.id)
        .await
        .unwrap();
    assert_eq!(approvals.len(), 1);
    assert_eq!(approvals[0].decision, Decision::Approved);
    assert_eq!(
        approvals[0].checksum_up_at_decision,
        run.run.checksum_up_at_request
    );
    assert_eq!(
        approvals[0].checksum_down_at_decision,
        run.run.checksum_down_at_request
    );
}

#[tokio::test]
async fn decide_on_decided_run_is_invalid_status() {
    let fx = fixture().await;
    let run = runs::request(&fx.db, request_input(&fx, "apply")).await.unwrap();
    runs::decide(&fx.db, decide_input(&fx, run.run.id, Decision::Approved))
        .await
        .unwrap();

    let err = runs::decide(&fx.db, decide_input(&fx, run.run.id, Decision::Approved))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "invalid_status");
}

#[tokio::test]
async fn denied_run_is_terminal() {
    let fx = fixture().await;
    let run = runs::request(&fx.db, request_input(&fx, "apply")).await.unwrap();
    let denied = runs::decide(&fx.db, decide_input(&fx, run.run.id, Decision::Denied))
        .await
        .unwrap();
    assert_eq!(denied.status, RunStatus::Denied);

    // No re-decide, no execute; a fresh run is required.
    let redecide = runs::decide(&fx.db, decide_input(&fx, run.run.id, Decision::Approved)).await;
    assert_eq!(redecide.unwrap_err().code(), "invalid_status");

    let exec = executor::execute_run(
        &fx.db,
        &fx.secrets,
        fx.project.id,
        run.run.id,
        fx.requester.id,
    )
    .await;
    assert_eq!(exec.unwrap_err().code(), "invalid_status");

    // A denial is still an approval-table record.
    let approvals = migrations::list_approvals(&fx.db, fx.migration.id)
        .await
        .unwrap();
    assert_eq!(approvals.len(), 1);
    assert_eq!(approvals[0].decision, Decision::Denied);
}

#[tokio::test]
async fn edit_between_request_and_decide_fails_checksum() {
    let fx = fixture().await;
    let run = runs::request(&fx.db, request_input(&fx, "apply")).await.unwrap();

    migrations::update(
        &fx.db,
        fx.project.id,
        fx.migration.id,
        UpdateMigrationInput {
            sql_up: Some("CREATE TABLE t(id bigserial);".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let err = runs::decide(&fx.db, decide_input(&fx, run.run.id, Decision::Approved))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ChecksumMismatch));

    // The run is still pending; only approval was refused.
    let fetched = runs::get(&fx.db, fx.project.id, run.run.id).await.unwrap();
    assert_eq!(fetched.status, RunStatus::AwaitingApproval);
}

// Execution (catalog side)

#[tokio::test]
async fn execute_requires_approved_status() {
    let fx = fixture().await;
    let run = runs::request(&fx.db, request_input(&fx, "apply")).await.unwrap();

    let err = executor::execute_run(
        &fx.db,
        &fx.secrets,
        fx.project.id,
        run.run.id,
        fx.requester.id,
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "invalid_status");

    let fetched = runs::get(&fx.db, fx.project.id, run.run.id).await.unwrap();
    assert_eq!(fetched.status, RunStatus::AwaitingApproval);
}

#[tokio::test]
async fn execute_revalidates_checksums_without_touching_status() {
    let fx = fixture().await;
    let run = runs::request(&fx.db, request_input(&fx, "apply")).await.unwrap();
    runs::decide(&fx.db, decide_input(&fx, run.run.id, Decision::Approved))
        .await
        .unwrap();

    // The edit wipes approvals but the already-approved run keeps its status;
    // the execute gate is what catches the divergence.
    migrations::update(
        &fx.db,
        fx.project.id,
        fx.migration.id,
        UpdateMigrationInput {
            sql_up: Some("CREATE TABLE t(id bigint);".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let err = executor::execute_run(
        &fx.db,
        &fx.secrets,
        fx.project.id,
        run.run.id,
        fx.requester.id,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::ChecksumMismatch));

    let fetched = runs::get(&fx.db, fx.project.id, run.run.id).await.unwrap();
    assert_eq!(fetched.status, RunStatus::Approved);
}

#[tokio::test]
async fn execute_marks_disabled_target_item_failed() {
    let fx = fixture().await;
    let run = runs::request(&fx.db, request_input(&fx, "apply")).await.unwrap();
    runs::decide(&fx.db, decide_input(&fx, run.run.id, Decision::Approved))
        .await
        .unwrap();

    // Disabling after request does not cancel the item; it fails per-item.
    db_targets::disable(&fx.db, fx.target.id).await.unwrap();

    let result = executor::execute_run(
        &fx.db,
        &fx.secrets,
        fx.project.id,
        run.run.id,
        fx.requester.id,
    )
    .await
    .unwrap();

    assert_eq!(result.run.status, RunStatus::Failed);
    assert!(result.run.finished_at.is_some());
    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].status, RunItemStatus::Failed);
    assert_eq!(result.items[0].error.as_deref(), Some("target disabled"));
}

#[tokio::test]
async fn execute_records_connect_failure_on_item() {
    let fx = fixture().await;
    let run = runs::request(&fx.db, request_input(&fx, "apply")).await.unwrap();
    runs::decide(&fx.db, decide_input(&fx, run.run.id, Decision::Approved))
        .await
        .unwrap();

    let result = executor::execute_run(
        &fx.db,
        &fx.secrets,
        fx.project.id,
        run.run.id,
        fx.requester.id,
    )
    .await
    .unwrap();

    assert_eq!(result.run.status, RunStatus::Failed);
    assert_eq!(result.run.executed_by, Some(fx.requester.id));
    assert!(result.run.started_at.is_some());
    let item = &result.items[0];
    assert_eq!(item.status, RunItemStatus::Failed);
    assert!(item.error.as_deref().unwrap_or("").contains("target error"));
    assert!(item.started_at.is_some());
    assert!(item.finished_at.is_some());
}

#[tokio::test]
async fn failed_run_state_satisfies_invariants() {
    let fx = fixture().await;
    let run = runs::request(&fx.db, request_input(&fx, "apply")).await.unwrap();
    runs::decide(&fx.db, decide_input(&fx, run.run.id, Decision::Approved))
        .await
        .unwrap();
    let result = executor::execute_run(
        &fx.db,
        &fx.secrets,
        fx.project.id,
        run.run.id,
        fx.requester.id,
    )
    .await
    .unwrap();

    // Every failed run has at least one failed/canceled item.
    assert_eq!(result.run.status, RunStatus::Failed);
    assert!(result
        .items
        .iter()
        .any(|i| matches!(i.status, RunItemStatus::Failed | RunItemStatus::Canceled)));
}

// Users & provisioning

#[tokio::test]
async fn external_login_provisions_and_links() {
    let db = setup().await;

    // Auto-provision off, unknown user: refused.
    let err = users::find_or_create_external(&db, "sub-1", "new@example.com", "New", false)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "not_found");

    // Auto-provision on: created as role user with login stamped.
    let user = users::find_or_create_external(&db, "sub-1", "new@example.com", "New", true)
        .await
        .unwrap();
    assert_eq!(user.role, Role::User);
    assert_eq!(user.external_subject.as_deref(), Some("sub-1"));
    assert!(user.last_login_at.is_some());

    // Pre-provisioned user gets the subject linked on first login.
    let pre = users::create(
        &db,
        CreateUserInput {
            email: "Pre@Example.com".into(),
            name: "Pre".into(),
            role: Some(Role::Manager),
        },
    )
    .await
    .unwrap();
    assert_eq!(pre.email, "pre@example.com");
    let linked = users::find_or_create_external(&db, "sub-2", "pre@example.com", "Pre", false)
        .await
        .unwrap();
    assert_eq!(linked.id, pre.id);
    assert_eq!(linked.external_subject.as_deref(), Some("sub-2"));
    assert_eq!(linked.role, Role::Manager);
}

#[tokio::test]
async fn disabled_user_cannot_login() {
    let db = setup().await;
    let user = users::find_or_create_external(&db, "sub-9", "gone@example.com", "Gone", true)
        .await
        .unwrap();
    users::disable(&db, user.id).await.unwrap();

    let err = users::find_or_create_external(&db, "sub-9", "gone@example.com", "Gone", true)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "unauthorized");

    let err = users::get(&db, user.id).await.unwrap_err();
    assert_eq!(err.code(), "unauthorized");
}

#[tokio::test]
async fn duplicate_email_is_conflict_and_role_is_updatable() {
    let db = setup().await;
    let user = users::create(
        &db,
        CreateUserInput {
            email: "dup@example.com".into(),
            name: "One".into(),
            role: None,
        },
    )
    .await
    .unwrap();

    let dup = users::create(
        &db,
        CreateUserInput {
            email: "DUP@example.com".into(),
            name: "Two".into(),
            role: None,
        },
    )
    .await;
    assert_eq!(dup.unwrap_err().code(), "conflict");

    let updated = users::update(
        &db,
        user.id,
        UpdateUserInput {
            name: "One".into(),
            role: Role::Admin,
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.role, Role::Admin);
}

// DB inventory

#[tokio::test]
async fn db_set_uniqueness_is_per_project_env_name() {
    let fx = fixture().await;

    let dup = db_sets::create(&fx.db, fx.project.id, "stg", "s", fx.requester.id).await;
    assert_eq!(dup.unwrap_err().code(), "conflict");

    // Same name in a different env is fine.
    db_sets::create(&fx.db, fx.project.id, "prd", "s", fx.requester.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn target_password_round_trips_through_secret_box() {
    let fx = fixture().await;
    let (_, sealed) = db_targets::get_with_secret(&fx.db, fx.target.id)
        .await
        .unwrap();
    assert_ne!(sealed.as_slice(), b"pw");
    assert_eq!(fx.secrets.open(&sealed).unwrap(), b"pw");
}

#[tokio::test]
async fn target_validation() {
    let fx = fixture().await;
    let bad_engine = db_targets::create(
        &fx.db,
        &fx.secrets,
        CreateTargetInput {
            db_set_id: fx.set.id,
            engine: "oracle".into(),
            host: "h".into(),
            port: 1521,
            dbname: "d".into(),
            username: "u".into(),
            password: "p".into(),
            options: None,
        },
    )
    .await;
    assert_eq!(bad_engine.unwrap_err().code(), "validation_error");

    let bad_port = db_targets::create(
        &fx.db,
        &fx.secrets,
        CreateTargetInput {
            db_set_id: fx.set.id,
            engine: "mysql".into(),
            host: "h".into(),
            port: 0,
            dbname: "d".into(),
            username: "u".into(),
            password: "p".into(),
            options: None,
        },
    )
    .await;
    assert_eq!(bad_port.unwrap_err().code(), "validation_error");
}

// Audit

#[tokio::test]
async fn services_emit_audit_events() {
    let fx = fixture().await;

    migrate_hub_server::services::migrations::update(
        &fx.db,
        fx.project.id,
        fx.requester.id,
        fx.migration.id,
        UpdateMigrationInput {
            sql_up: Some("CREATE TABLE t(id bigint);".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let events = audit_events::list_recent(&fx.db, 50).await.unwrap();
    let actions: Vec<&str> = events.iter().map(|e| e.action.as_str()).collect();
    assert!(actions.contains(&"migration_updated"));
    assert!(actions.contains(&"migration_approvals_invalidated"));
}
