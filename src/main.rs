// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{path::PathBuf, sync::Arc};
use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_registry::DashboardRegistry;
use crate::application::dashboard_service::DashboardService;
use crate::application::sandbox_service::SandboxService;
use crate::application::view_registry::ViewRegistry;
use crate::application::view_service::ViewService;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::flights_seed::init_database;
use crate::infrastructure::scratch_engine::SqliteScratchEngine;
use crate::infrastructure::sqlite_source::SqliteSource;
use crate::presentation::app_state::AppState;
use crate::presentation::routes::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config().context("Failed to load configuration")?;

    // Seed the source database (infrastructure layer)
    let db_path = PathBuf::from(&config.database.path);
    let seed_path = db_path.clone();
    let seed_rows = config.database.seed_rows;
    tokio::task::spawn_blocking(move || init_database(&seed_path, seed_rows))
        .await
        .context("Database seeding task failed")??;

    let source = Arc::new(SqliteSource::new(db_path));
    let engine = Arc::new(SqliteScratchEngine::new());

    // Shared registries, live for the whole process
    let views = Arc::new(ViewRegistry::new());
    let items = Arc::new(DashboardRegistry::new());

    // Create services (application layer)
    let view_service = ViewService::new(views.clone(), source);
    let dashboard_service = DashboardService::new(views.clone(), items);
    let sandbox_service = SandboxService::new(views, engine);

    // Create application state
    let state = Arc::new(AppState {
        view_service,
        dashboard_service,
        sandbox_service,
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr = config.server.socket_addr()?;
    tracing::info!("Starting view-workspace service on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, router).await?;

    Ok(())
}
