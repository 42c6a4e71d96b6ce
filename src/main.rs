//! callclock conversation timer service.
//!
//! Main entry point. Loads configuration, connects the configured store and
//! serves the webhook routes until SIGINT or SIGTERM.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use callclock_api::{start_server, AppState, Config, StoreBackend};
use callclock_core::{
    storage::{conversation_times::Repository, MemoryStore, RestStore},
    ConversationStore, RealClock,
};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    init_tracing(&config.rust_log)?;

    info!("Starting callclock conversation timer");
    info!(
        server_addr = %format!("{}:{}", config.host, config.port),
        store_backend = ?config.store_backend,
        signature_header = %config.signature_header,
        "Configuration loaded"
    );

    let addr = config.parse_server_addr()?;
    let (store, pool) = create_store(&config).await?;

    let state = AppState::new(store, Arc::new(RealClock::new()), config.to_signature_config());

    info!(addr = %addr, "callclock is ready to receive webhooks");
    start_server(state, addr, config.request_timeout()).await.context("HTTP server failed")?;

    if let Some(pool) = pool {
        pool.close().await;
        info!("Database connections closed");
    }

    info!("callclock shutdown complete");
    Ok(())
}

/// Initializes tracing from the configured filter directives.
fn init_tracing(directives: &str) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_new(directives)
        .or_else(|_| EnvFilter::try_new("info,callclock=debug,tower_http=debug"))
        .context("Invalid RUST_LOG filter")?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
    Ok(())
}

/// Builds the configured store. Returns the pool as well when one was opened
/// so it can be closed on shutdown.
async fn create_store(config: &Config) -> Result<(Arc<dyn ConversationStore>, Option<PgPool>)> {
    match config.store_backend {
        StoreBackend::Postgres => {
            info!(database_url = %config.database_url_masked(), "Connecting to PostgreSQL");
            let pool = create_database_pool(config).await?;

            let repository = Repository::new(Arc::new(pool.clone()));
            repository.ensure_schema().await.context("Failed to prepare conversation_times")?;
            info!("Database connection pool established");

            let store: Arc<dyn ConversationStore> = Arc::new(repository);
            Ok((store, Some(pool)))
        },
        StoreBackend::Rest => {
            info!(supabase_url = %config.supabase_url, "Using hosted REST store");
            let store: Arc<dyn ConversationStore> = Arc::new(
                RestStore::new(config.to_rest_store_config())
                    .context("Failed to build REST store client")?,
            );
            Ok((store, None))
        },
        StoreBackend::Memory => {
            warn!("Using in-memory store; start times are lost on restart");
            let store: Arc<dyn ConversationStore> = Arc::new(MemoryStore::new());
            Ok((store, None))
        },
    }
}

/// Creates the database connection pool and verifies it answers queries.
async fn create_database_pool(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(config.database_connection_timeout())
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database_url)
        .await
        .context("Failed to create database connection pool")?;

    sqlx::query("SELECT 1")
        .fetch_one(&pool)
        .await
        .context("Failed to verify database connection")?;

    Ok(pool)
}
