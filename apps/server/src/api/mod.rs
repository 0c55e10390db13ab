//! HTTP transport: one JSON route per command-surface operation.
//!
//! Handlers are deliberately thin: extract the actor, decode the body,
//! dispatch to `crate::commands`, encode the result. Errors map to HTTP via
//! `AppError`'s `ResponseError` impl.

pub mod audit;
pub mod health;
pub mod inventory;
pub mod migrations;
pub mod projects;
pub mod runs;
pub mod users;

pub use audit::configure_routes as configure_audit_routes;
pub use health::configure_routes as configure_health_routes;
pub use inventory::configure_routes as configure_inventory_routes;
pub use migrations::configure_routes as configure_migration_routes;
pub use projects::configure_routes as configure_project_routes;
pub use runs::configure_routes as configure_run_routes;
pub use users::configure_routes as configure_user_routes;
