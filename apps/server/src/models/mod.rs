//! Domain models for Migrate Hub.
//!
//! Plain data types shared by the store, services, command surface, and
//! transport. SeaORM entities live in `crate::entity`; these types are what
//! callers see.

pub mod approval;
pub mod audit_event;
pub mod db_set;
pub mod db_target;
pub mod migration;
pub mod project;
pub mod run;
pub mod user;

pub use approval::Approval;
pub use audit_event::AuditEvent;
pub use db_set::{DbSet, Env};
pub use db_target::{CreateTargetInput, DbTarget, Engine, UpdateTargetInput};
pub use migration::{
    checksum, CreateMigrationInput, Migration, TransactionMode, UpdateMigrationInput,
};
pub use project::Project;
pub use run::{
    Decision, DecideRunInput, RequestRunInput, Run, RunItem, RunItemStatus, RunStatus, RunType,
    RunWithItems,
};
pub use user::{CreateUserInput, Role, UpdateUserInput, User};
