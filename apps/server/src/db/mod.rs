//! Catalog database module: connection management, migrations, and the store
//! operations for every entity in the data model.
//!
//! All state-changing operations that touch more than one row run inside a
//! single SeaORM transaction; concurrency control otherwise relies on the
//! database's unique constraints and status-guarded updates.

pub mod audit_events;
pub mod db_sets;
pub mod db_targets;
pub mod migrations;
pub mod projects;
pub mod runs;
pub mod users;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::migration::Migrator;
use sea_orm_migration::MigratorTrait;

/// Catalog database connection pool wrapper using SeaORM.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Create a new catalog pool from configuration.
    pub async fn new(config: &Config) -> AppResult<Self> {
        let db = &config.database;
        let mut opt = ConnectOptions::new(&db.url);
        opt.max_connections(db.max_connections)
            .min_connections(db.min_connections)
            .connect_timeout(Duration::from_secs(db.connect_timeout_secs))
            .acquire_timeout(Duration::from_secs(db.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(db.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(db.max_lifetime_secs))
            .sqlx_logging(false);

        let conn = Database::connect(opt)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to catalog: {}", e)))?;

        info!("Catalog database connection established");

        Ok(DbPool { conn })
    }

    /// Run pending catalog schema migrations.
    pub async fn run_migrations(&self) -> AppResult<()> {
        Migrator::up(&self.conn, None)
            .await
            .map_err(|e| AppError::Database(format!("Failed to run catalog migrations: {}", e)))?;
        info!("Catalog migrations complete");
        Ok(())
    }

    /// Get the database connection.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }
}

/// True when a DbErr is a unique-constraint violation, so stores can surface
/// `conflict` instead of a generic database error.
pub(crate) fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}
