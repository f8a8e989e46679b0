//! Finance Tracker - Main Application Entry Point
//!
//! A REST API server for personal finance: accounts, categories,
//! income/expense transactions with automatic balance reconciliation,
//! summaries and financial goals.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx, or an in-memory store when no
//!   `DATABASE_URL` is set
//! - **Authentication**: API key with SHA-256 hashing
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Open the store (create pool and run migrations for PostgreSQL)
//! 3. Register the bootstrap user, if a key is configured
//! 4. Build HTTP router with routes and middleware
//! 5. Start server on configured port

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use finance_tracker::{
    app::{AppState, build_router},
    config::Config,
    db,
    middleware::auth::hash_api_key,
    store::{MemoryStore, PgStore, SharedStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let store: SharedStore = match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = db::create_pool(database_url, config.database_max_connections).await?;
            tracing::info!("Database pool created");

            db::run_migrations(&pool).await?;
            tracing::info!("Database migrations complete");

            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store, data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    if let Some(api_key) = config.bootstrap_api_key.as_deref() {
        let user = store
            .register_user(&config.bootstrap_user_name, &hash_api_key(api_key))
            .await?;
        tracing::info!(user_id = %user.id, "Bootstrap user registered");
    }

    let app = build_router(AppState::new(store, config.pagination()));

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
