//! Attendance API - Main Application Entry Point
//!
//! Backend for a workforce attendance platform: employees check in and out
//! from biometric devices or the mobile app, and tenants connect through
//! their own API keys.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Admission**: per-tenant API key, origin/IP allow-lists, per-minute limits
//! - **Sessions**: HS256 tokens issued at login
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Start the expired-counter sweep
//! 5. Build HTTP router with routes and middleware
//! 6. Start server on configured port

mod clock;
mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod state;
#[cfg(test)]
mod testing;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use tracing_subscriber::EnvFilter;

use crate::{clock::SystemClock, services::counter_store::MemoryCounterStore, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Create database pool
    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    // Process-local counters for rate limiting and login blocks
    let clock = Arc::new(SystemClock);
    let counters = Arc::new(MemoryCounterStore::new(clock.clone()));

    let sweep_every = Duration::from_secs(config.counter_sweep_secs.max(1));
    let sweeper = counters.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            let purged = sweeper.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "expired counters purged");
            }
        }
    });

    let state = AppState::new(pool, &config, counters, clock)?;
    let app = routes::build_router(state);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Connection info feeds the source-address checks of the admission gate
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
