//! SeaORM entity definitions for the catalog database.

pub mod approval;
pub mod audit_event;
pub mod db_set;
pub mod db_target;
pub mod migration;
pub mod project;
pub mod run;
pub mod run_item;
pub mod user;
