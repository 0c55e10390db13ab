//! Migrate Hub server - main entry point.

mod api;
mod auth;
mod commands;
mod config;
mod context;
mod db;
mod entity;
mod error;
mod middleware;
mod migration;
mod models;
mod secret;
mod services;

use actix_web::{web, App, HttpServer};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;
use crate::context::AppContext;
use crate::db::DbPool;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, MIGRATEHUB_DB_DSN and MIGRATEHUB_SECRET_KEY must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Migrate Hub Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
        if config.identity.dev_header_auth {
            warn!("Dev header authentication is enabled (X-MigrateHub-* headers are trusted)");
        }
    }

    let pool = DbPool::new(&config)
        .await
        .expect("Failed to initialize catalog database");

    pool.run_migrations()
        .await
        .expect("Failed to run catalog migrations");

    let bind_address = config.http_addr.clone();
    let ctx = AppContext::new(pool, config);

    info!("Starting server at http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::RequestLogger)
            .app_data(web::Data::new(ctx.clone()))
            .service(
                web::scope("/api/v1")
                    .configure(api::configure_health_routes)
                    .configure(api::configure_project_routes)
                    .configure(api::configure_user_routes)
                    .configure(api::configure_inventory_routes)
                    .configure(api::configure_migration_routes)
                    .configure(api::configure_run_routes)
                    .configure(api::configure_audit_routes),
            )
    })
    .bind(&bind_address)?
    .run()
    .await
}
