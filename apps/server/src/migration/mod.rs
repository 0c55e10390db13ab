//! SeaORM migrations for the catalog database.
//!
//! Conventions:
//! - UUID primary keys generated by the application
//! - Backend-agnostic DSL so the schema also builds on SQLite in tests
//! - Cascading deletes for owned child tables (db_sets -> db_targets,
//!   runs -> run_items, migrations -> approvals/runs)

pub use sea_orm_migration::prelude::*;

mod m20250612_000001_create_projects;
mod m20250612_000002_create_users;
mod m20250612_000003_create_db_sets;
mod m20250612_000004_create_db_targets;
mod m20250612_000005_create_migrations;
mod m20250612_000006_create_approvals;
mod m20250612_000007_create_runs;
mod m20250612_000008_create_run_items;
mod m20250612_000009_create_audit_events;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250612_000001_create_projects::Migration),
            Box::new(m20250612_000002_create_users::Migration),
            Box::new(m20250612_000003_create_db_sets::Migration),
            Box::new(m20250612_000004_create_db_targets::Migration),
            Box::new(m20250612_000005_create_migrations::Migration),
            Box::new(m20250612_000006_create_approvals::Migration),
            Box::new(m20250612_000007_create_runs::Migration),
            Box::new(m20250612_000008_create_run_items::Migration),
            Box::new(m20250612_000009_create_audit_events::Migration),
        ]
    }
}
